use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use crate::models::location::LocationEvent;
use crate::pubsub::frame::Frame;
use crate::pubsub::{FeedError, LocationFeed, LocationStream, order_topic};

const SUBSCRIPTION_ID: &str = "sub-0";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// STOMP 1.2 over a plain WebSocket, one connection per subscription.
pub struct StompFeed {
    url: String,
    host: String,
}

impl StompFeed {
    pub fn new(url: impl Into<String>) -> Result<Self, FeedError> {
        let url = url.into();
        let host = Url::parse(&url)
            .map_err(|err| FeedError::InvalidUrl(format!("{url}: {err}")))?
            .host_str()
            .ok_or_else(|| FeedError::InvalidUrl(format!("{url}: missing host")))?
            .to_string();

        Ok(Self { url, host })
    }
}

#[async_trait]
impl LocationFeed for StompFeed {
    async fn subscribe(&self, order_id: u64) -> Result<LocationStream, FeedError> {
        let (mut socket, _response) = connect_async(self.url.as_str()).await?;

        let connect = Frame::new("CONNECT")
            .header("accept-version", "1.2")
            .header("host", self.host.as_str())
            .header("heart-beat", "0,0");
        socket.send(Message::Text(connect.encode().into())).await?;
        await_connected(&mut socket).await?;

        let destination = order_topic(order_id);
        let subscribe = Frame::new("SUBSCRIBE")
            .header("id", SUBSCRIPTION_ID)
            .header("destination", destination.as_str())
            .header("ack", "auto");
        socket.send(Message::Text(subscribe.encode().into())).await?;

        info!(order_id, destination = %destination, "subscribed to location topic");

        let events = socket.filter_map(|message| async move { decode_message(message) });
        Ok(Box::pin(events))
    }
}

async fn await_connected(socket: &mut Socket) -> Result<(), FeedError> {
    while let Some(message) = socket.next().await {
        let Some(frame) = frame_of(message?)? else {
            continue;
        };

        match frame.command.as_str() {
            "CONNECTED" => {
                debug!(version = frame.get("version").unwrap_or("?"), "stomp session established");
                return Ok(());
            }
            "ERROR" => return Err(broker_error(&frame)),
            other => debug!(command = other, "ignoring frame before CONNECTED"),
        }
    }

    Err(FeedError::Closed)
}

fn frame_of(message: Message) -> Result<Option<Frame>, FeedError> {
    match message {
        Message::Text(text) => Ok(Frame::parse(&text)?),
        Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
            Ok(text) => Ok(Frame::parse(text)?),
            Err(_) => Ok(None),
        },
        _ => Ok(None),
    }
}

fn broker_error(frame: &Frame) -> FeedError {
    FeedError::Broker {
        message: frame.get("message").unwrap_or("unknown").to_string(),
        body: frame.body.clone(),
    }
}

fn decode_message(
    message: Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Option<Result<LocationEvent, FeedError>> {
    let frame = match message.map_err(FeedError::from).and_then(frame_of) {
        Ok(Some(frame)) => frame,
        Ok(None) => return None,
        Err(err) => return Some(Err(err)),
    };

    match frame.command.as_str() {
        "MESSAGE" => Some(serde_json::from_str(&frame.body).map_err(FeedError::from)),
        "ERROR" => Some(Err(broker_error(&frame))),
        _ => None,
    }
}
