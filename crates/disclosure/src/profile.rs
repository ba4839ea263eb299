//! Encrypted profile fields.
//!
//! Each field value is sealed under its own field key. Keys are derived on
//! demand through [`FieldKeyDerivation`] and never stored, so what a caller
//! can read is exactly what the active context is permitted to derive.

use std::collections::BTreeMap;
use std::sync::Arc;

use disclosure_core::{Identity, PublicKey};
use disclosure_perms::{FieldKeyDerivation, GrantedKeys};
use disclosure_store::{FieldMap, ProfileRepository};

use crate::error::Result;

/// Plaintext profile values: field name to value.
pub type ProfileData = BTreeMap<String, String>;

/// Reads and writes one identity's encrypted profile.
#[derive(Clone)]
pub struct ProfileStore {
    identity: Arc<dyn Identity>,
    repository: Arc<dyn ProfileRepository>,
    keys: FieldKeyDerivation,
}

impl ProfileStore {
    pub fn new(
        identity: Arc<dyn Identity>,
        repository: Arc<dyn ProfileRepository>,
        keys: FieldKeyDerivation,
    ) -> Self {
        Self {
            identity,
            repository,
            keys,
        }
    }

    /// Decrypt the fields of `owner` this context may read.
    ///
    /// Keys come from this identity, so only its own profile decrypts. Fields
    /// without permission are omitted. A permitted field that fails to
    /// decrypt is [`ClientError::Decryption`](crate::ClientError::Decryption).
    pub async fn get_data(&self, owner: &PublicKey) -> Result<ProfileData> {
        let raw = self.repository.get_profile(owner).await?;
        let mut data = ProfileData::new();

        for (name, ciphertext) in raw {
            let Some(key) = self
                .keys
                .generate_field_key(self.identity.as_ref(), &name)
                .await?
            else {
                continue;
            };

            let value = key.open(&ciphertext)?;
            data.insert(name, value);
        }

        tracing::debug!(owner = %owner.address(), fields = data.len(), "read profile");
        Ok(data)
    }

    /// Encrypt and store `values` under this identity.
    ///
    /// Returns the stored ciphertexts. Fields this context may not write are
    /// skipped and absent from the result.
    pub async fn update_data(&self, values: &ProfileData) -> Result<FieldMap> {
        let owner = self.identity.public_key();
        let mut sealed = FieldMap::new();

        for (name, value) in values {
            match self
                .keys
                .generate_field_key(self.identity.as_ref(), name)
                .await?
            {
                Some(key) => {
                    sealed.insert(name.clone(), key.seal(value)?);
                }
                None => tracing::debug!(field = %name, "skipping field without write permission"),
            }
        }

        if !sealed.is_empty() {
            self.repository.put_fields(&owner, &sealed).await?;
        }

        tracing::debug!(owner = %owner.address(), fields = sealed.len(), "updated profile");
        Ok(sealed)
    }

    /// The stored ciphertexts of `owner`, unchanged.
    pub async fn get_raw_data(&self, owner: &PublicKey) -> Result<FieldMap> {
        Ok(self.repository.get_profile(owner).await?)
    }

    /// Decrypt another owner's fields with keys they disclosed.
    ///
    /// Fields without a disclosed key are omitted; a wrong key is
    /// [`ClientError::Decryption`](crate::ClientError::Decryption).
    pub async fn get_authorized_data(
        &self,
        owner: &PublicKey,
        granted: &GrantedKeys,
    ) -> Result<ProfileData> {
        let raw = self.repository.get_profile(owner).await?;
        let mut data = ProfileData::new();

        for (name, ciphertext) in raw {
            if let Some(key) = granted.key(&name)? {
                data.insert(name, key.open(&ciphertext)?);
            }
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use disclosure_core::{DataRequest, LocalIdentity};
    use disclosure_perms::{
        derive_field_key, AccessContext, PermissionResolver, PermissionsSource, PermsError, Site,
        SiteDataSource,
    };
    use disclosure_store::MemoryStore;

    use crate::error::ClientError;

    struct Sites(Vec<Site>);

    #[async_trait]
    impl SiteDataSource for Sites {
        async fn get_site_data(&self, origin: &str) -> disclosure_perms::Result<Site> {
            self.0
                .iter()
                .find(|s| s.origin == origin)
                .cloned()
                .ok_or_else(|| PermsError::SiteNotFound(origin.to_string()))
        }
    }

    struct NoGrants;

    #[async_trait]
    impl PermissionsSource for NoGrants {
        async fn grant_access_records(
            &self,
            _: &Site,
            _: &PublicKey,
        ) -> disclosure_perms::Result<Vec<DataRequest>> {
            Ok(Vec::new())
        }
    }

    fn profile_store(
        identity: Arc<LocalIdentity>,
        repository: Arc<MemoryStore>,
        context: AccessContext,
    ) -> ProfileStore {
        let sites = Sites(vec![Site::new(
            "https://open.example",
            LocalIdentity::generate().public_key(),
        )]);
        let resolver = Arc::new(PermissionResolver::new(Arc::new(sites), Arc::new(NoGrants)));
        ProfileStore::new(identity, repository, FieldKeyDerivation::new(resolver, context))
    }

    fn values(pairs: &[(&str, &str)]) -> ProfileData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_update_then_get_roundtrip() {
        let identity = Arc::new(LocalIdentity::generate());
        let store = profile_store(identity.clone(), Arc::new(MemoryStore::new()), AccessContext::Owner);

        let written = store.update_data(&values(&[("email", "a@b.com")])).await.unwrap();
        assert_eq!(written.len(), 1);

        let data = store.get_data(&identity.public_key()).await.unwrap();
        assert_eq!(data, values(&[("email", "a@b.com")]));
    }

    #[tokio::test]
    async fn test_rewrite_changes_ciphertext() {
        let identity = Arc::new(LocalIdentity::generate());
        let store = profile_store(identity.clone(), Arc::new(MemoryStore::new()), AccessContext::Owner);
        let input = values(&[("email", "a@b.com")]);

        let first = store.update_data(&input).await.unwrap();
        let second = store.update_data(&input).await.unwrap();
        assert_ne!(first["email"], second["email"]);

        let key = derive_field_key(&identity.secret_digest(), "email");
        assert_eq!(key.open(&first["email"]).unwrap(), "a@b.com");
        assert_eq!(key.open(&second["email"]).unwrap(), "a@b.com");
    }

    #[tokio::test]
    async fn test_denied_fields_are_omitted() {
        let identity = Arc::new(LocalIdentity::generate());
        let repository = Arc::new(MemoryStore::new());
        let owner_store = profile_store(identity.clone(), repository.clone(), AccessContext::Owner);
        owner_store
            .update_data(&values(&[("email", "a@b.com"), ("name", "Alisa")]))
            .await
            .unwrap();

        let site_store = profile_store(
            identity.clone(),
            repository,
            AccessContext::origin("https://open.example"),
        );
        assert!(site_store.get_data(&identity.public_key()).await.unwrap().is_empty());

        let written = site_store.update_data(&values(&[("email", "x@y.z")])).await.unwrap();
        assert!(written.is_empty());
        assert_eq!(site_store.get_raw_data(&identity.public_key()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_corrupted_permitted_field_is_decryption_error() {
        let identity = Arc::new(LocalIdentity::generate());
        let repository = Arc::new(MemoryStore::new());
        let mut broken = FieldMap::new();
        broken.insert("email".into(), "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".into());
        repository.put_fields(&identity.public_key(), &broken).await.unwrap();

        let store = profile_store(identity.clone(), repository, AccessContext::Owner);
        let err = store.get_data(&identity.public_key()).await.unwrap_err();
        assert!(matches!(err, ClientError::Decryption(_)));
    }

    #[tokio::test]
    async fn test_authorized_data_with_granted_keys() {
        let owner = Arc::new(LocalIdentity::generate());
        let reader = Arc::new(LocalIdentity::generate());
        let repository = Arc::new(MemoryStore::new());

        profile_store(owner.clone(), repository.clone(), AccessContext::Owner)
            .update_data(&values(&[("email", "a@b.com"), ("name", "Alisa")]))
            .await
            .unwrap();

        let mut granted = GrantedKeys::new();
        granted.insert("email", &derive_field_key(&owner.secret_digest(), "email"));

        let reader_store = profile_store(reader, repository, AccessContext::Owner);
        let data = reader_store
            .get_authorized_data(&owner.public_key(), &granted)
            .await
            .unwrap();
        assert_eq!(data, values(&[("email", "a@b.com")]));

        let mut wrong = GrantedKeys::new();
        wrong.insert("name", &derive_field_key(&owner.secret_digest(), "email"));
        let err = reader_store
            .get_authorized_data(&owner.public_key(), &wrong)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decryption(_)));
    }
}
