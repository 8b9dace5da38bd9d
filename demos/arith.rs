//! Client and server halves exchanging encoded calls over an in-process
//! channel. Run with `RUST_LOG=rpcdata=trace` to watch the decoder.

use rpcdata::{call, name, structured, Codec, Dispatcher, Registry, RpcData, RpcFunction};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot},
    task,
};
use tracing_subscriber::EnvFilter;

structured! {
    #[derive(Debug, Clone)]
    pub struct Args {
        pub a: i64,
        pub b: i64,
    }
}

structured! {
    #[derive(Debug)]
    pub struct Reply {
        pub c: i64,
    }
}

pub struct Mul;

impl RpcFunction for Mul {
    name!("Arith.Mul");
    call! {
        async fn call(&self, (args,): (Args,)) -> Reply {
            Reply { c: args.a * args.b }
        }
    }
}

type Request = (Vec<u8>, oneshot::Sender<Vec<u8>>);

async fn serve(codec: Codec, dispatcher: Dispatcher, mut requests: mpsc::Receiver<Request>) {
    while let Some((bytes, respond)) = requests.recv().await {
        match dispatcher.handle(&codec, &bytes).await {
            Ok(reply) => {
                _ = respond.send(reply);
            }
            Err(err) => tracing::warn!(%err, "request failed"),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = Arc::new(Registry::new());
    registry.register_type::<Args>().unwrap();
    registry.register_type::<Reply>().unwrap();
    let codec = Codec::new(registry);

    let mut dispatcher = Dispatcher::new();
    dispatcher.add(Mul);

    let (tx, rx) = mpsc::channel(8);
    task::spawn(serve(codec.clone(), dispatcher, rx));

    let args = Args { a: 10, b: 20 };
    let request = codec
        .encode(&RpcData::new("Arith.Mul").with_arg(args.clone()))
        .unwrap();

    let (respond, response) = oneshot::channel();
    tx.send((request, respond)).await.unwrap();
    let reply = codec.decode(&response.await.unwrap()).unwrap();
    let reply: Reply = reply.arg(0).unwrap().unwrap();

    println!("{} * {} = {}", args.a, args.b, reply.c);
}
