//! Per-runtime finalized-block publication.
//!
//! Wraps [`oasis_core_common::broker::Broker`], which already replays the
//! latest value to new subscribers, with a round-monotonicity filter: a
//! subscriber must never see an `AnnotatedBlock` whose round regresses
//! past one it already received, which can otherwise happen if a round
//! is re-finalized after a backup-path recovery racing a slow
//! subscriber's replay.
use oasis_core_common::broker::{Broker, BrokerStream};

use crate::types::AnnotatedBlock;

pub struct BlockBroker {
    inner: Broker<AnnotatedBlock>,
}

impl BlockBroker {
    pub fn new(capacity: usize) -> Self {
        BlockBroker {
            inner: Broker::new(capacity),
        }
    }

    pub fn publish(&self, block: AnnotatedBlock) {
        self.inner.publish(block);
    }

    pub fn subscribe(&self) -> BlockWatch {
        BlockWatch {
            stream: self.inner.subscribe(),
            last_delivered_round: None,
        }
    }
}

pub struct BlockWatch {
    stream: BrokerStream<AnnotatedBlock>,
    last_delivered_round: Option<u64>,
}

impl BlockWatch {
    pub async fn recv(&mut self) -> Option<AnnotatedBlock> {
        loop {
            let block = self.stream.recv().await?;
            let round = block.block.header.round;
            if let Some(last) = self.last_delivered_round {
                if round <= last {
                    continue;
                }
            }
            self.last_delivered_round = Some(round);
            return Some(block);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::{Block, Header};

    fn block(round: u64) -> AnnotatedBlock {
        AnnotatedBlock {
            consensus_height: round as i64,
            block: Block {
                header: Header {
                    round,
                    ..Header::default()
                },
            },
        }
    }

    #[tokio::test]
    async fn test_replay_then_drops_non_advancing_rounds() {
        let broker = BlockBroker::new(16);
        broker.publish(block(1));

        let mut watch = broker.subscribe();
        assert_eq!(watch.recv().await.unwrap().block.header.round, 1);

        broker.publish(block(1));
        broker.publish(block(2));
        assert_eq!(watch.recv().await.unwrap().block.header.round, 2);
    }
}
