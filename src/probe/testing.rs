use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use trust_dns_resolver::proto::op::{Message, MessageType, ResponseCode};

use super::cancel::CancelHandle;
use crate::dns_probe::prelude::*;

#[derive(Clone, Copy)]
pub enum Reply {
    Code(ResponseCode),
    Transport,
    Missing,
}

/// Scripted exchanger: pops one reply per call (defaulting to success),
/// remembers when each call started and can fire a cancellation once a
/// given number of calls have been made.
pub struct ScriptedExchanger {
    script: Mutex<VecDeque<(Duration, Reply)>>,
    calls: Mutex<Vec<Instant>>,
    cancel_after: Option<(usize, CancelHandle)>,
}

impl ScriptedExchanger {
    pub fn new(script: Vec<(Duration, Reply)>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            cancel_after: None,
        }
    }

    pub fn cancelling_after(mut self, calls: usize, handle: CancelHandle) -> Self {
        self.cancel_after = Some((calls, handle));
        self
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

impl Exchanger for ScriptedExchanger {
    async fn exchange(
        &self,
        query: &Message,
        _server: SocketAddr,
    ) -> Result<Option<Message>, ExchangeError> {
        let made = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Instant::now());
            calls.len()
        };
        let (latency, reply) = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((Duration::ZERO, Reply::Code(ResponseCode::NoError)));
        sleep(latency).await;

        if let Some((after, handle)) = &self.cancel_after {
            if made == *after {
                handle.cancel();
            }
        }

        match reply {
            Reply::Transport => Err(ExchangeError::Timeout(latency)),
            Reply::Missing => Ok(None),
            Reply::Code(code) => {
                let mut response = Message::new();
                response
                    .set_id(query.id())
                    .set_message_type(MessageType::Response)
                    .set_response_code(code);
                Ok(Some(response))
            }
        }
    }
}
