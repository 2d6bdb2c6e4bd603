//! Editor, signer and hook processes
//!
//! Everything that waits on another program goes through [`ExternalTools`],
//! so the commit pipeline can be driven by a stub in tests.

pub mod process;

use crate::artifacts::builder::signing::SigningRequest;
use crate::artifacts::objects::object_id::ObjectId;
use std::path::Path;

#[allow(async_fn_in_trait)]
pub trait ExternalTools {
    /// Let the user edit the message file at `path` in place
    async fn edit_message(&self, path: &Path) -> anyhow::Result<()>;

    /// Produce a signed commit for `request` and return its id
    ///
    /// The commit must already be in the object database when this returns.
    async fn sign(&self, request: &SigningRequest) -> anyhow::Result<ObjectId>;

    /// Run the hook at `hook`; a non-zero exit is an error
    async fn run_hook(&self, hook: &Path, args: &[&Path]) -> anyhow::Result<()>;
}
