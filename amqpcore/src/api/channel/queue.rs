use amqp_wire::types::{AmqpMessageCount, FieldTable};

use super::{short_str, Channel, Responder};
use crate::{
    api::{deferred::Deferred, error::Result},
    frame::{
        BindQueue, BindQueueOk, DeclareQueue, DeclareQueueOk, DeleteQueue, DeleteQueueOk,
        PurgeQueue, PurgeQueueOk, UnbindQueue, UnbindQueueOk,
    },
};

/// Arguments of `queue.declare`.
///
/// An empty queue name lets the broker generate one, see [`QueueDeclareOk::queue`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueueDeclareArguments {
    pub queue: String,
    pub passive: bool,
    pub durable: bool,
    pub exclusive: bool,
    pub auto_delete: bool,
    pub arguments: FieldTable,
}

impl QueueDeclareArguments {
    pub fn new(queue: &str) -> Self {
        Self {
            queue: queue.to_owned(),
            passive: false,
            durable: false,
            exclusive: false,
            auto_delete: false,
            arguments: FieldTable::new(),
        }
    }

    impl_chainable_setter! {
        passive: bool,
        durable: bool,
        exclusive: bool,
        auto_delete: bool,
        arguments: FieldTable
    }
}

/// Reply of `queue.declare`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDeclareOk {
    pub(crate) queue: String,
    pub(crate) message_count: AmqpMessageCount,
    pub(crate) consumer_count: u32,
}

impl QueueDeclareOk {
    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn message_count(&self) -> AmqpMessageCount {
        self.message_count
    }

    pub fn consumer_count(&self) -> u32 {
        self.consumer_count
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueBindArguments {
    pub queue: String,
    pub exchange: String,
    pub routing_key: String,
    pub arguments: FieldTable,
}

impl QueueBindArguments {
    pub fn new(queue: &str, exchange: &str, routing_key: &str) -> Self {
        Self {
            queue: queue.to_owned(),
            exchange: exchange.to_owned(),
            routing_key: routing_key.to_owned(),
            arguments: FieldTable::new(),
        }
    }

    impl_chainable_setter! {
        arguments: FieldTable
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueUnbindArguments {
    pub queue: String,
    pub exchange: String,
    pub routing_key: String,
    pub arguments: FieldTable,
}

impl QueueUnbindArguments {
    pub fn new(queue: &str, exchange: &str, routing_key: &str) -> Self {
        Self {
            queue: queue.to_owned(),
            exchange: exchange.to_owned(),
            routing_key: routing_key.to_owned(),
            arguments: FieldTable::new(),
        }
    }

    impl_chainable_setter! {
        arguments: FieldTable
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePurgeArguments {
    pub queue: String,
}

impl QueuePurgeArguments {
    pub fn new(queue: &str) -> Self {
        Self {
            queue: queue.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDeleteArguments {
    pub queue: String,
    pub if_unused: bool,
    pub if_empty: bool,
}

impl QueueDeleteArguments {
    pub fn new(queue: &str) -> Self {
        Self {
            queue: queue.to_owned(),
            if_unused: false,
            if_empty: false,
        }
    }

    impl_chainable_setter! {
        if_unused: bool,
        if_empty: bool
    }
}

/////////////////////////////////////////////////////////////////////////////
impl Channel {
    pub fn declare_queue(&self, args: QueueDeclareArguments) -> Result<Deferred<QueueDeclareOk>> {
        let mut declare = DeclareQueue::new(short_str("queue name", &args.queue)?, args.arguments);
        declare.set_passive(args.passive);
        declare.set_durable(args.durable);
        declare.set_exclusive(args.exclusive);
        declare.set_auto_delete(args.auto_delete);

        let deferred = Deferred::new();
        self.request(
            declare.into_frame(),
            DeclareQueueOk::header(),
            Responder::QueueDeclare(deferred.clone()),
        )?;
        Ok(deferred)
    }

    pub fn bind_queue(&self, args: QueueBindArguments) -> Result<Deferred<()>> {
        let bind = BindQueue::new(
            short_str("queue name", &args.queue)?,
            short_str("exchange name", &args.exchange)?,
            short_str("routing key", &args.routing_key)?,
            args.arguments,
        );
        let deferred = Deferred::new();
        self.request(
            bind.into_frame(),
            BindQueueOk::header(),
            Responder::Unit(deferred.clone()),
        )?;
        Ok(deferred)
    }

    pub fn unbind_queue(&self, args: QueueUnbindArguments) -> Result<Deferred<()>> {
        let unbind = UnbindQueue::new(
            short_str("queue name", &args.queue)?,
            short_str("exchange name", &args.exchange)?,
            short_str("routing key", &args.routing_key)?,
            args.arguments,
        );
        let deferred = Deferred::new();
        self.request(
            unbind.into_frame(),
            UnbindQueueOk::header(),
            Responder::Unit(deferred.clone()),
        )?;
        Ok(deferred)
    }

    /// Resolved with the number of messages purged.
    pub fn purge_queue(&self, args: QueuePurgeArguments) -> Result<Deferred<AmqpMessageCount>> {
        let purge = PurgeQueue::new(short_str("queue name", &args.queue)?);
        let deferred = Deferred::new();
        self.request(
            purge.into_frame(),
            PurgeQueueOk::header(),
            Responder::MessageCount(deferred.clone()),
        )?;
        Ok(deferred)
    }

    /// Resolved with the number of messages deleted along with the queue.
    pub fn delete_queue(&self, args: QueueDeleteArguments) -> Result<Deferred<AmqpMessageCount>> {
        let mut delete = DeleteQueue::new(short_str("queue name", &args.queue)?);
        delete.set_if_unused(args.if_unused);
        delete.set_if_empty(args.if_empty);

        let deferred = Deferred::new();
        self.request(
            delete.into_frame(),
            DeleteQueueOk::header(),
            Responder::MessageCount(deferred.clone()),
        )?;
        Ok(deferred)
    }
}
