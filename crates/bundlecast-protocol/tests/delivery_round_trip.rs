//! End-to-end delivery against mocked origin and extractor services.
//!
//! The fixture is a three-block bundle with a known plaintext. The origin
//! mock serves the binary header; the extractor mocks answer the grouped
//! window requests the pipeline is expected to make. A missing or
//! mis-parameterized request matches no mock and fails the delivery, so the
//! wire encoding is asserted implicitly.

use bundlecast_formats::{BundleDescriptor, FileLocator};
use bundlecast_protocol::{
    BundleDelivery, BundleOrigin, Delivery, DeliveryError, ExtractorClient, transport,
};
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BLOCK_SIZE: usize = 0x40000;

/// Bundle of two full blocks plus a short 0x10000-byte tail block.
const TOTAL_SIZE: usize = 0x90000;
const COMPRESSED_SIZES: [u32; 3] = [256, 512, 128];

/// File straddling all three blocks: tail of block 0, all of block 1, head
/// of block 2.
const FILE_OFFSET: usize = 0x3F800;
const FILE_SIZE: usize = 0x41000;

fn plaintext(range: std::ops::Range<usize>) -> Vec<u8> {
    range.map(|i| (i % 251) as u8).collect()
}

fn header_bytes() -> Vec<u8> {
    let mut buf = vec![0u8; 60 + COMPRESSED_SIZES.len() * 4];
    buf[0..4].copy_from_slice(&(TOTAL_SIZE as u32).to_le_bytes());
    let declared = 60 + COMPRESSED_SIZES.len() as u32 * 4 - 12;
    buf[8..12].copy_from_slice(&declared.to_le_bytes());
    for (i, size) in COMPRESSED_SIZES.iter().enumerate() {
        buf[60 + i * 4..64 + i * 4].copy_from_slice(&size.to_le_bytes());
    }
    buf
}

fn locator(origin_uri: &str) -> FileLocator {
    FileLocator {
        bundle: BundleDescriptor {
            base_url: format!("{origin_uri}/3.26.1.2/"),
            name: "Data/Fixture".to_string(),
            total_size: TOTAL_SIZE as u64,
        },
        offset: FILE_OFFSET as u64,
        size: FILE_SIZE as u64,
        mime_type: None,
    }
}

async fn mount_origin(origin: &MockServer, etag: Option<&str>) {
    let mut response = ResponseTemplate::new(206).set_body_bytes(header_bytes());
    if let Some(etag) = etag {
        response = response
            .insert_header("etag", etag)
            .insert_header("cache-control", "public, max-age=3600");
    }
    Mock::given(method("GET"))
        .and(path("/3.26.1.2/Bundles2/Data/Fixture.bundle.bin"))
        .and(header("range", "bytes=0-71"))
        .respond_with(response)
        .mount(origin)
        .await;
}

fn pipeline(origin: &MockServer, extractor: &MockServer) -> BundleDelivery {
    transport::install_crypto_provider();
    let http = transport::build_client().expect("client should build");
    BundleDelivery::new(
        BundleOrigin::new(http.clone()),
        ExtractorClient::new(
            http,
            Url::parse(&extractor.uri()).expect("mock uri should parse"),
        )
        .with_subrequest_ceiling(2),
    )
}

/// With a ceiling of 2, the three planned blocks form groups [0, 1] and [2].
/// Group one's window is bytes 0x3F800..0x80000 of its concatenated
/// plaintext; group two asks for the first 0x800 bytes of the tail block.
async fn mount_extractor_honoring_ranges(extractor: &MockServer, bundle_url: &str) {
    Mock::given(method("GET"))
        .and(query_param("url", bundle_url))
        .and(query_param("offset", "72,328"))
        .and(query_param("compressed", "256,512"))
        .and(query_param("extracted", "262144,262144"))
        .and(header("range", "bytes=260096-524287"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", "bytes 260096-524287/524288")
                .set_body_bytes(plaintext(0x3F800..0x80000)),
        )
        .mount(extractor)
        .await;

    Mock::given(method("GET"))
        .and(query_param("url", bundle_url))
        .and(query_param("offset", "840"))
        .and(query_param("compressed", "128"))
        .and(query_param("extracted", "65536"))
        .and(header("range", "bytes=0-2047"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", "bytes 0-2047/65536")
                .set_body_bytes(plaintext(0x80000..0x80800)),
        )
        .mount(extractor)
        .await;
}

#[tokio::test]
async fn round_trip_reconstructs_exact_bytes() {
    let origin = MockServer::start().await;
    let extractor = MockServer::start().await;

    mount_origin(&origin, Some("\"v1\"")).await;
    let locator = locator(&origin.uri());
    mount_extractor_honoring_ranges(&extractor, &locator.bundle.url()).await;

    let delivery = pipeline(&origin, &extractor)
        .deliver(&locator, None)
        .await
        .expect("delivery should succeed");

    let Delivery::File(file) = delivery else {
        panic!("expected a delivered file");
    };
    assert_eq!(file.body.len(), FILE_SIZE);
    assert_eq!(file.body, plaintext(FILE_OFFSET..FILE_OFFSET + FILE_SIZE));
    assert_eq!(file.validators.etag(), Some("\"v1\""));
}

#[tokio::test]
async fn sloppy_extractor_windows_are_trimmed() {
    let origin = MockServer::start().await;
    let extractor = MockServer::start().await;

    mount_origin(&origin, None).await;
    let locator = locator(&origin.uri());

    // This extractor ignores Range entirely and sends each group's full
    // decompressed span without a content-range header; the pipeline must
    // trim both the leading and trailing excess itself.
    Mock::given(method("GET"))
        .and(query_param("offset", "72,328"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(plaintext(0..0x80000)))
        .mount(&extractor)
        .await;
    Mock::given(method("GET"))
        .and(query_param("offset", "840"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(plaintext(0x80000..0x90000)))
        .mount(&extractor)
        .await;

    let delivery = pipeline(&origin, &extractor)
        .deliver(&locator, None)
        .await
        .expect("delivery should succeed");

    let Delivery::File(file) = delivery else {
        panic!("expected a delivered file");
    };
    assert_eq!(file.body, plaintext(FILE_OFFSET..FILE_OFFSET + FILE_SIZE));
}

#[tokio::test]
async fn matching_validator_short_circuits() {
    let origin = MockServer::start().await;
    let extractor = MockServer::start().await;

    mount_origin(&origin, Some("\"v1\"")).await;

    // No extractor mock is mounted: a block fetch would fail the request.
    let delivery = pipeline(&origin, &extractor)
        .deliver(&locator(&origin.uri()), Some("\"aaa\", \"v1\""))
        .await
        .expect("delivery should succeed");

    let Delivery::NotModified { validators } = delivery else {
        panic!("expected a 304 outcome");
    };
    assert_eq!(validators.etag(), Some("\"v1\""));
}

#[tokio::test]
async fn origin_failure_is_upstream_unavailable() {
    let origin = MockServer::start().await;
    let extractor = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&origin)
        .await;

    let result = pipeline(&origin, &extractor)
        .deliver(&locator(&origin.uri()), None)
        .await;

    assert!(matches!(
        result,
        Err(DeliveryError::UpstreamUnavailable { .. })
    ));
}

#[tokio::test]
async fn extractor_failure_keeps_diagnostic_body() {
    let origin = MockServer::start().await;
    let extractor = MockServer::start().await;

    mount_origin(&origin, None).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("decompressor offline"))
        .mount(&extractor)
        .await;

    let result = pipeline(&origin, &extractor)
        .deliver(&locator(&origin.uri()), None)
        .await;

    match result {
        Err(DeliveryError::Extractor { status, body }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "decompressor offline");
        }
        other => panic!("expected an extractor error, got {other:?}"),
    }
}
