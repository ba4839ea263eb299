//! Per-field key derivation.
//!
//! A field key is a deterministic function of the identity's secret digest
//! and the lowercased field name. It is only handed out when the resolved
//! permission for the caller's context admits the field.

use std::sync::Arc;

use disclosure_core::{FieldKey, Identity, SecretDigest, FIELD_KEY_LEN};

use crate::error::Result;
use crate::permission::AccessContext;
use crate::resolver::PermissionResolver;

/// Domain separation for field key derivation.
const FIELD_KEY_CONTEXT: &str = "disclosure v1 field key";

/// Derive the key for `field_name` without any permission check.
pub fn derive_field_key(digest: &SecretDigest, field_name: &str) -> FieldKey {
    let mut hasher = blake3::Hasher::new_derive_key(FIELD_KEY_CONTEXT);
    hasher.update(digest.as_bytes());
    hasher.update(field_name.to_lowercase().as_bytes());

    let mut out = [0u8; FIELD_KEY_LEN];
    hasher.finalize_xof().fill(&mut out);
    FieldKey::from_bytes(out)
}

/// Hands out field keys gated by permission.
#[derive(Clone)]
pub struct FieldKeyDerivation {
    resolver: Arc<PermissionResolver>,
    context: AccessContext,
}

impl FieldKeyDerivation {
    pub fn new(resolver: Arc<PermissionResolver>, context: AccessContext) -> Self {
        Self { resolver, context }
    }

    /// The context keys are derived for.
    pub fn context(&self) -> &AccessContext {
        &self.context
    }

    pub fn resolver(&self) -> &Arc<PermissionResolver> {
        &self.resolver
    }

    /// Key for `field_name`, or `None` if the context may not read it.
    pub async fn generate_field_key<I>(&self, identity: &I, field_name: &str) -> Result<Option<FieldKey>>
    where
        I: Identity + ?Sized,
    {
        let permission = self.resolver.resolve(identity, &self.context).await?;

        if !permission.allows(field_name) {
            tracing::debug!(field = %field_name, "field not permitted");
            return Ok(None);
        }

        Ok(Some(derive_field_key(&identity.secret_digest(), field_name)))
    }
}
