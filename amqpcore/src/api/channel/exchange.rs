use amqp_wire::types::FieldTable;

use super::{short_str, Channel, Responder};
use crate::{
    api::{deferred::Deferred, error::Result},
    frame::{Declare, DeclareOk, Delete, DeleteOk},
};

/// Arguments of `exchange.declare`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeDeclareArguments {
    pub exchange: String,
    /// `direct`, `fanout`, `topic`, `headers` or a plugin type.
    pub exchange_type: String,
    pub passive: bool,
    pub durable: bool,
    pub auto_delete: bool,
    pub internal: bool,
    pub arguments: FieldTable,
}

impl ExchangeDeclareArguments {
    pub fn new(exchange: &str, exchange_type: &str) -> Self {
        Self {
            exchange: exchange.to_owned(),
            exchange_type: exchange_type.to_owned(),
            passive: false,
            durable: false,
            auto_delete: false,
            internal: false,
            arguments: FieldTable::new(),
        }
    }

    impl_chainable_setter! {
        passive: bool,
        durable: bool,
        auto_delete: bool,
        internal: bool,
        arguments: FieldTable
    }
}

/// Arguments of `exchange.delete`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeDeleteArguments {
    pub exchange: String,
    pub if_unused: bool,
}

impl ExchangeDeleteArguments {
    pub fn new(exchange: &str) -> Self {
        Self {
            exchange: exchange.to_owned(),
            if_unused: false,
        }
    }

    impl_chainable_setter! {
        if_unused: bool
    }
}

impl Channel {
    pub fn declare_exchange(&self, args: ExchangeDeclareArguments) -> Result<Deferred<()>> {
        let mut declare = Declare::new(
            short_str("exchange name", &args.exchange)?,
            short_str("exchange type", &args.exchange_type)?,
            args.arguments,
        );
        declare.set_passive(args.passive);
        declare.set_durable(args.durable);
        declare.set_auto_delete(args.auto_delete);
        declare.set_internal(args.internal);

        let deferred = Deferred::new();
        self.request(
            declare.into_frame(),
            DeclareOk::header(),
            Responder::Unit(deferred.clone()),
        )?;
        Ok(deferred)
    }

    pub fn delete_exchange(&self, args: ExchangeDeleteArguments) -> Result<Deferred<()>> {
        let mut delete = Delete::new(short_str("exchange name", &args.exchange)?);
        delete.set_if_unused(args.if_unused);

        let deferred = Deferred::new();
        self.request(
            delete.into_frame(),
            DeleteOk::header(),
            Responder::Unit(deferred.clone()),
        )?;
        Ok(deferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_declare_arguments() {
        let args = ExchangeDeclareArguments::new("logs", "topic")
            .durable(true)
            .auto_delete(true)
            .finish();
        assert_eq!("logs", args.exchange);
        assert_eq!("topic", args.exchange_type);
        assert!(args.durable);
        assert!(args.auto_delete);
        assert!(!args.passive);
        assert!(!args.internal);
        assert!(args.arguments.is_empty());
    }

    #[test]
    fn test_exchange_delete_arguments() {
        let args = ExchangeDeleteArguments::new("logs").if_unused(true).finish();
        assert_eq!("logs", args.exchange);
        assert!(args.if_unused);
    }
}
