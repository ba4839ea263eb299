//! End-to-end profile and request exchanges between identities.

use std::sync::Arc;

use anyhow::Result;
use proptest::prelude::*;

use disclosure::core::{Identity, LocalIdentity};
use disclosure::perms::FieldKeyDerivation;
use disclosure::rpc::{LoopbackTransport, StoreHandler};
use disclosure::store::SqliteStore;
use disclosure::{
    AccessContext, Client, ClientConfig, ClientError, KdfParams, OfferId, ProfileData,
    RequestId, RequestState, TransportError,
};
use disclosure_testkit::{generators, init_tracing, multi_party_fixtures, StaticSiteSource, TestFixture};

fn values(pairs: &[(&str, &str)]) -> ProfileData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn profile_roundtrip_with_fresh_nonces() -> Result<()> {
    init_tracing();
    let owner = TestFixture::new();
    let client = owner.client();

    let first = client.profile().update_data(&values(&[("email", "a@b.com")])).await?;
    assert_eq!(
        client.profile().get_data(&owner.public_key()).await?,
        values(&[("email", "a@b.com")])
    );

    let second = client.profile().update_data(&values(&[("email", "a@b.com")])).await?;
    assert_ne!(first["email"], second["email"]);
    assert_eq!(
        client.profile().get_raw_data(&owner.public_key()).await?["email"],
        second["email"]
    );
    assert_eq!(client.profile().get_data(&owner.public_key()).await?["email"], "a@b.com");
    Ok(())
}

#[tokio::test]
async fn profile_survives_sqlite_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("profile.db");
    let identity = Arc::new(LocalIdentity::generate());
    let sites = Arc::new(StaticSiteSource::new());

    {
        let store = Arc::new(SqliteStore::open(&path)?);
        let client = Client::local(identity.clone(), store, sites.clone(), ClientConfig::default());
        client
            .profile()
            .update_data(&values(&[("email", "a@b.com"), ("city", "Zürich")]))
            .await?;
    }

    let store = Arc::new(SqliteStore::open(&path)?);
    let client = Client::local(identity.clone(), store, sites, ClientConfig::default());
    let data = client.profile().get_data(&identity.public_key()).await?;
    assert_eq!(data, values(&[("city", "Zürich"), ("email", "a@b.com")]));
    Ok(())
}

#[test]
fn passphrase_derivation_is_deterministic() {
    let a = TestFixture::from_passphrase("open sesame");
    let b = TestFixture::from_passphrase("open sesame");
    assert_eq!(a.public_key(), b.public_key());
    assert_eq!(
        a.identity.secret_digest().as_bytes(),
        b.identity.secret_digest().as_bytes()
    );

    let config = ClientConfig::default().with_kdf(KdfParams::light());
    let client = Client::from_passphrase(
        "open sesame",
        a.store.clone(),
        a.store.clone(),
        a.sites.clone(),
        config,
    )
    .expect("light parameters derive");
    assert_eq!(client.public_key(), a.public_key());
}

#[tokio::test]
async fn site_permissions_gate_field_keys() -> Result<()> {
    let owner = TestFixture::new();
    let open = owner.register_site("https://open.example");
    let trusted = owner.register_confidential_site("https://trusted.example");
    let resolver = owner.client().resolver().clone();

    let as_open = FieldKeyDerivation::new(resolver.clone(), AccessContext::origin(open.origin()));
    let as_trusted = FieldKeyDerivation::new(resolver, AccessContext::origin(trusted.origin()));

    for name in ["email", "Phone", "address_line_2", ""] {
        assert!(as_open.generate_field_key(owner.identity.as_ref(), name).await?.is_none());
        assert!(as_trusted.generate_field_key(owner.identity.as_ref(), name).await?.is_some());
    }

    let missing = FieldKeyDerivation::new(
        as_open.resolver().clone(),
        AccessContext::origin("https://unknown.example"),
    );
    let err = missing
        .generate_field_key(owner.identity.as_ref(), "email")
        .await
        .unwrap_err();
    assert!(matches!(err, disclosure::perms::PermsError::SiteNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn request_accept_and_read_fields() -> Result<()> {
    init_tracing();
    let parties = multi_party_fixtures(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    let (alice_client, bob_client) = (alice.client(), bob.client());

    bob_client
        .profile()
        .update_data(&values(&[("email", "bob@example.com"), ("phone", "555-0100")]))
        .await?;

    let id = alice_client
        .requests()
        .create_request(&bob.public_key(), &["email"])
        .await?;

    let from_alice = alice_client
        .requests()
        .get_requests(Some(&alice.public_key()), None, RequestState::Await)
        .await?;
    let to_bob = bob_client
        .requests()
        .get_requests(None, Some(&bob.public_key()), RequestState::Await)
        .await?;
    assert_eq!(from_alice.len(), 1);
    assert_eq!(from_alice, to_bob);
    assert_eq!(to_bob[0].id, id);

    let asked = bob_client.requests().get_requested_fields(&to_bob[0])?;
    bob_client
        .requests()
        .accept_request(id, &alice.public_key(), asked.as_slice())
        .await?;

    let accepted = alice_client
        .requests()
        .get_requests(Some(&alice.public_key()), Some(&bob.public_key()), RequestState::Accept)
        .await?;
    let keys = alice_client.requests().get_granted_keys(&accepted[0])?;
    let disclosed = alice_client
        .profile()
        .get_authorized_data(&bob.public_key(), &keys)
        .await?;
    assert_eq!(disclosed, values(&[("email", "bob@example.com")]));

    // her own context cannot open his fields
    assert!(matches!(
        alice_client.profile().get_data(&bob.public_key()).await,
        Err(ClientError::Decryption(_))
    ));
    Ok(())
}

#[tokio::test]
async fn terminal_requests_reject_transitions() -> Result<()> {
    let parties = multi_party_fixtures(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    let workflow = bob.client().requests().clone();

    let id = alice
        .client()
        .requests()
        .create_request(&bob.public_key(), &["email"])
        .await?;
    workflow.response_to_request(id, &alice.public_key(), b"{}").await?;

    let err = workflow
        .response_to_request(id, &alice.public_key(), b"{}")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::InvalidState { state: RequestState::Accept, .. }
    ));

    let err = workflow
        .response_to_request(RequestId(9_999), &alice.public_key(), b"{}")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(RequestId(9_999))));
    Ok(())
}

#[tokio::test]
async fn outsiders_cannot_answer_requests() -> Result<()> {
    let parties = multi_party_fixtures(3);
    let (alice, bob, carol) = (&parties[0], &parties[1], &parties[2]);

    let id = alice
        .client()
        .requests()
        .create_request(&bob.public_key(), &["email"])
        .await?;

    let carol_flow = carol.client().requests().clone();
    let err = carol_flow
        .accept_request(id, &alice.public_key(), &["email"])
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotAddressee(_)));
    let err = carol_flow.reject_request(id).await.unwrap_err();
    assert!(matches!(err, ClientError::NotAddressee(_)));

    let err = bob
        .client()
        .requests()
        .accept_request(id, &carol.public_key(), &["email"])
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::RequesterMismatch { .. }));

    let waiting = alice
        .client()
        .requests()
        .get_requests(Some(&alice.public_key()), None, RequestState::Await)
        .await?;
    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0].id, id);
    Ok(())
}

#[tokio::test]
async fn outsiders_cannot_read_exchanges() -> Result<()> {
    let parties = multi_party_fixtures(3);
    let (alice, bob, carol) = (&parties[0], &parties[1], &parties[2]);

    let id = alice
        .client()
        .requests()
        .create_request(&bob.public_key(), &["email"])
        .await?;
    bob.client()
        .requests()
        .accept_request(id, &alice.public_key(), &["email"])
        .await?;

    let carol_flow = carol.client().requests().clone();
    let records = carol_flow
        .get_requests(Some(&alice.public_key()), None, RequestState::Accept)
        .await?;
    let record = &records[0];

    for sealed in [&record.request_data, &record.response_data] {
        let sealed = sealed.as_ref().expect("both payloads present");
        for counterparty in [alice.public_key(), bob.public_key()] {
            assert!(matches!(
                carol_flow.decrypt_message(&counterparty, sealed),
                Err(ClientError::Decryption(_))
            ));
        }
    }
    assert!(matches!(
        carol_flow.get_granted_keys(record),
        Err(ClientError::Decryption(_))
    ));
    Ok(())
}

#[tokio::test]
async fn grants_open_fields_to_sites_and_offers() -> Result<()> {
    let owner = TestFixture::new();
    let shop = owner.register_site("https://shop.example");
    let advertiser = owner.peer();
    let client = owner.client();

    client
        .profile()
        .update_data(&values(&[("email", "me@example.com"), ("zip", "94110")]))
        .await?;

    let as_shop = owner.client_for(shop.origin());
    assert!(as_shop.profile().get_data(&owner.public_key()).await?.is_empty());

    client
        .requests()
        .grant_access_for_client(&shop.public_key(), &["ZIP"])
        .await?;
    as_shop.invalidate_permissions(shop.origin()).await;
    assert_eq!(
        as_shop.profile().get_data(&owner.public_key()).await?,
        values(&[("zip", "94110")])
    );

    // writes through the site context touch permitted fields only
    let written = as_shop
        .profile()
        .update_data(&values(&[("zip", "10001"), ("email", "spoof@example.com")]))
        .await?;
    assert_eq!(written.len(), 1);
    assert_eq!(client.profile().get_data(&owner.public_key()).await?["email"], "me@example.com");

    let id = client
        .requests()
        .grant_access_for_offer(OfferId(42), &advertiser.public_key(), &["email"])
        .await?;
    let advertiser_client = advertiser.client();
    let record = advertiser_client
        .requests()
        .get_requests(Some(&advertiser.public_key()), None, RequestState::Accept)
        .await?
        .into_iter()
        .find(|r| r.id == id)
        .expect("offer grant listed");
    assert_eq!(record.offer_id, Some(OfferId(42)));

    let keys = advertiser_client.requests().get_granted_keys(&record)?;
    let disclosed = advertiser_client
        .profile()
        .get_authorized_data(&owner.public_key(), &keys)
        .await?;
    assert_eq!(disclosed, values(&[("email", "me@example.com")]));
    Ok(())
}

#[tokio::test]
async fn exchange_over_loopback_rpc() -> Result<()> {
    init_tracing();
    let sites = Arc::new(StaticSiteSource::new());
    let shop = disclosure_testkit::SiteFixture::new("https://shop.example");
    sites.insert(shop.site.clone());

    let backend = Arc::new(SqliteStore::open_memory()?);
    let handler = Arc::new(StoreHandler::new(backend, sites));
    let transport = Arc::new(LoopbackTransport::new(handler));

    let alice_id = Arc::new(LocalIdentity::generate());
    let bob_id = Arc::new(LocalIdentity::generate());
    let alice = Client::over_transport(alice_id.clone(), transport.clone(), ClientConfig::default());
    let bob = Client::over_transport(bob_id.clone(), transport.clone(), ClientConfig::default());

    bob.profile()
        .update_data(&values(&[("email", "bob@example.com")]))
        .await?;
    let id = alice
        .requests()
        .create_request(&bob.public_key(), &["email"])
        .await?;
    bob.requests()
        .accept_request(id, &alice.public_key(), &["email"])
        .await?;

    let accepted = alice
        .requests()
        .get_requests(Some(&alice.public_key()), None, RequestState::Accept)
        .await?;
    let keys = alice.requests().get_granted_keys(&accepted[0])?;
    assert_eq!(
        alice.profile().get_authorized_data(&bob.public_key(), &keys).await?,
        values(&[("email", "bob@example.com")])
    );

    let err = bob.requests().reject_request(id).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidState { .. }));

    // site lookups travel the same connection
    let bob_as_shop = bob.with_context(Some(shop.origin().to_string()));
    assert!(bob_as_shop.profile().get_data(&bob.public_key()).await?.is_empty());
    let unknown = bob.with_context(Some("https://unknown.example".into()));
    assert!(matches!(
        unknown.profile().get_data(&bob.public_key()).await,
        Err(ClientError::Permission(_))
    ));

    alice.disconnect().await;
    assert!(!transport.is_connected());
    let err = bob
        .requests()
        .get_requests(None, Some(&bob.public_key()), RequestState::Await)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(TransportError::Disconnected)));
    assert!(matches!(
        bob.profile().get_raw_data(&bob.public_key()).await,
        Err(ClientError::Transport(TransportError::Disconnected))
    ));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn any_profile_roundtrips(profile in generators::profile(6)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let owner = TestFixture::new();
        let client = owner.client();

        let read = runtime.block_on(async {
            client.profile().update_data(&profile).await?;
            client.profile().get_data(&owner.public_key()).await
        }).unwrap();
        prop_assert_eq!(read, profile);
    }
}
