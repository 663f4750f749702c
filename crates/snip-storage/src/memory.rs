use async_trait::async_trait;
use snip_core::error::Result;
use snip_core::{Backend, Change, Relation};

/// Backend that persists nothing.
///
/// The relation lives only in the store's memory and is lost when the
/// process exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolatileBackend;

impl VolatileBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Backend for VolatileBackend {
    fn name(&self) -> &'static str {
        "volatile"
    }

    async fn load(&self) -> Result<Relation> {
        Ok(Relation::new())
    }

    async fn commit(&self, _change: &Change, _relation: &Relation) -> Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
