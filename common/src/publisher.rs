use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use caryatid_sdk::Context;
use tracing::debug;

use crate::commands::FetchCommand;
use crate::messages::Message;

/// Destination for outbound fetch commands, in the order given
#[async_trait]
pub trait FetchSink: Send + Sync {
    async fn publish(&self, command: FetchCommand) -> Result<()>;

    /// Stops at the first failure
    async fn publish_all(&self, commands: Vec<FetchCommand>) -> Result<()> {
        for command in commands {
            self.publish(command).await?;
        }
        Ok(())
    }
}

/// Publisher for outbound fetch commands
pub struct FetchPublisher {
    /// Module context
    context: Arc<Context<Message>>,

    /// Topic to publish on
    topic: String,
}

impl FetchPublisher {
    /// Construct with context and topic to publish on
    pub fn new(context: Arc<Context<Message>>, topic: String) -> Self {
        Self { context, topic }
    }
}

#[async_trait]
impl FetchSink for FetchPublisher {
    async fn publish(&self, command: FetchCommand) -> Result<()> {
        debug!(topic = %self.topic, ?command, "Publishing fetch command");
        self.context.publish(&self.topic, Arc::new(Message::Fetch(command))).await
    }
}
