//! The event poller. Watches the chain head and feeds matching logs through
//! the evaluator, one reaction block at a time on the calling thread.

use std::thread;
use std::time::Duration;

use crate::abi::AbiParam;
use crate::encoding::topics;
use crate::eth::rpc::{LogFilter, RpcClient, RpcError};
use crate::evaluator;
use crate::object::environment::Env;
use crate::object::{Event, Object};
use crate::util;

const POLL_INTERVAL: Duration = Duration::from_secs(5);

struct WatchedEvent {
    event: Event,
    inputs: Vec<AbiParam>,
    topic0: String,
}

pub struct EventManager {
    client: RpcClient,
    events: Vec<WatchedEvent>,
    last_block: Option<String>,
}

impl EventManager {
    /// Collect the reaction blocks registered in the environment and set up
    /// their log filters.
    pub fn new(endpoint: &str, env: &Env) -> Self {
        let mut events = Vec::new();
        for event in env.borrow().events() {
            let (inputs, topic0) = match event.abi.events.get(&event.method) {
                Some(event_abi) => (
                    event_abi.inputs.clone(),
                    util::encode_hex(&event_abi.topic0()),
                ),
                None => {
                    eprintln!("event abi not found for {}_{}", event.contract, event.method);
                    continue;
                }
            };
            events.push(WatchedEvent {
                event,
                inputs,
                topic0,
            });
        }

        Self {
            client: RpcClient::new(endpoint),
            events,
            last_block: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Poll until the process is terminated. Failures are reported and the
    /// loop keeps going.
    pub fn run(&mut self) {
        loop {
            if let Err(err) = self.poll() {
                eprintln!("poll failed: {}", err);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// One poll round: fetch the head, and if it moved, dispatch that
    /// block's logs for every watched event.
    pub fn poll(&mut self) -> Result<(), RpcError> {
        let head = self.client.latest_block()?;
        if self.last_block.as_deref() == Some(head.hash.as_str()) {
            return Ok(());
        }
        self.last_block = Some(head.hash.clone());

        for watched in &self.events {
            let filter = LogFilter {
                block_hash: head.hash.clone(),
                address: watched.event.address.clone(),
                topics: vec![vec![watched.topic0.clone()]],
            };

            let logs = match self.client.logs(&filter) {
                Ok(logs) => logs,
                Err(err) => {
                    eprintln!("failed to fetch logs: {}", err);
                    continue;
                }
            };

            for log in logs {
                let values = match topics::parse_log(&watched.inputs, &log) {
                    Ok(values) => values,
                    Err(err) => {
                        eprintln!("failed to parse log: {}", err);
                        continue;
                    }
                };

                let result = evaluator::apply_event(&watched.event, values, &log);
                if let Object::Error(message) = result {
                    eprintln!("event handler failed: {}", message);
                }
            }
        }

        Ok(())
    }
}
