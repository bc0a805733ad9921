use amqpcore::{
    callbacks::DefaultConnectionHandler,
    channel::{
        BasicConsumeArguments, BasicPublishArguments, QueueBindArguments, QueueDeclareArguments,
    },
    connection::OpenConnectionArguments,
    net::TokioDriver,
    BasicProperties, Message,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // construct a subscriber that prints formatted traces to stdout
    // global subscriber with log level according to RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // the driver owns the socket, the connection handle is used to issue operations
    let args = OpenConnectionArguments::new("localhost", 5672, "user", "bitnami");
    let driver = TokioDriver::connect(args, DefaultConnectionHandler)
        .await
        .unwrap();
    let connection = driver.connection().clone();

    // operations are queued until the connection and channel are open
    let channel = connection.open_channel().unwrap();
    channel.on_error(|err| println!("channel failed: {}", err));

    let queue_name = "capy-test";
    let exchange_name = "amq.topic";
    let routing_key = "echo.ping";
    channel
        .declare_queue(QueueDeclareArguments::new(queue_name))
        .unwrap()
        .on_success(|ok| println!("declared {}, {} messages", ok.queue(), ok.message_count()));
    channel
        .bind_queue(QueueBindArguments::new(queue_name, exchange_name, routing_key))
        .unwrap();

    //////////////////////////////////////////////////////////////////////////////
    // consume, ack each message and close after the first one
    let consumer = channel
        .consume(BasicConsumeArguments::new(queue_name, "demo_declare_bind_consume"))
        .unwrap();
    {
        let channel = channel.clone();
        let connection = connection.clone();
        consumer.on_received(move |message: &Message| {
            println!(
                "received {} on {}: {}",
                message.delivery_tag(),
                message.routing_key(),
                String::from_utf8_lossy(message.body())
            );
            channel.ack(message.delivery_tag()).unwrap();
            // a second delivery may race the close
            let _ = connection.close();
        });
    }
    consumer.on_success(|tag| println!("consuming as {}", tag));

    //////////////////////////////////////////////////////////////////////////////
    // publish a message to ourselves
    channel
        .publish(
            BasicPublishArguments::new(exchange_name, routing_key),
            BasicProperties::default()
                .with_content_type("text/plain")
                .finish(),
            "ping",
        )
        .unwrap();

    // serve the connection until it is closed
    driver.run().await.unwrap();
}
