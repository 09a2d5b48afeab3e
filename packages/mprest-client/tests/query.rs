use std::collections::HashSet;

use mprest_client::{Criteria, Error, FilterValue, QueryOptions, Rester, routes};
use mprest_domain::SummaryDoc;
use mprest_testkit::{TestServer, summary_docs, test_config};

fn ids(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
	range.map(|n| format!("mp-{n}")).collect()
}

fn distinct_ids(data: &[serde_json::Value]) -> HashSet<String> {
	data.iter()
		.filter_map(|doc| doc.get("material_id").and_then(serde_json::Value::as_str))
		.map(str::to_string)
		.collect()
}

#[tokio::test]
async fn paginates_every_matching_document() {
	let server = TestServer::spawn_single("summary", summary_docs(25))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	let criteria = Criteria::new().filter("material_ids", Some(ids(1..=25)));
	let options = QueryOptions { chunk_size: Some(7), ..Default::default() };
	let result = rester.query(criteria, None, &options).await.expect("Query failed.");

	assert_eq!(result.data.len(), 25);
	assert_eq!(result.meta.total_doc, Some(25));
	assert_eq!(result.meta.shortfall, None);
	assert_eq!(distinct_ids(&result.data).len(), 25);
}

#[tokio::test]
async fn single_chunk_issues_a_single_round() {
	let server = TestServer::spawn_single("summary", summary_docs(30))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	// A scalar filter cannot split, so one chunk means one physical request.
	let criteria = Criteria::new().filter("formula", Some("SiO2"));
	let options =
		QueryOptions { chunk_size: Some(5), num_chunks: Some(1), ..Default::default() };
	let result = rester.query(criteria, None, &options).await.expect("Query failed.");

	assert_eq!(result.data.len(), 5);
	assert_eq!(result.meta.total_doc, Some(15));
	assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn four_ids_split_into_two_parallel_requests() {
	let server = TestServer::spawn_single("summary", summary_docs(10))
		.await
		.expect("Failed to spawn test server.");
	let mut cfg = test_config(&server.endpoint());

	cfg.query.num_parallel_requests = 2;

	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	let criteria = Criteria::new().filter("material_ids", Some(ids(1..=4)));
	let options =
		QueryOptions { chunk_size: Some(2), num_chunks: Some(1), ..Default::default() };
	let result = rester.query(criteria, None, &options).await.expect("Query failed.");

	// Two partitions of two ids, one round each, one document per partition.
	assert_eq!(server.hits(), 2);
	assert_eq!(result.data.len(), 2);
	assert_eq!(result.meta.total_doc, Some(4));
}

#[tokio::test]
async fn rebalances_when_one_partition_under_delivers() {
	// Only three documents exist; five of the requested ids match nothing.
	let server = TestServer::spawn_single("summary", summary_docs(3))
		.await
		.expect("Failed to spawn test server.");
	let mut cfg = test_config(&server.endpoint());

	cfg.query.num_parallel_requests = 2;

	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	let criteria = Criteria::new().filter("material_ids", Some(ids(1..=8)));
	let options = QueryOptions { chunk_size: Some(4), ..Default::default() };
	let result = rester.query(criteria, None, &options).await.expect("Query failed.");

	// Two initial requests plus one rebalance top-up.
	assert_eq!(server.hits(), 3);
	assert_eq!(result.data.len(), 3);
	assert_eq!(result.meta.total_doc, Some(3));
	assert_eq!(distinct_ids(&result.data), ids(1..=3).into_iter().collect());
}

#[tokio::test]
async fn permanent_shortfall_is_reported_in_meta() {
	let server = TestServer::spawn_single("summary", summary_docs(3))
		.await
		.expect("Failed to spawn test server.");
	let mut cfg = test_config(&server.endpoint());

	cfg.query.num_parallel_requests = 2;

	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	let criteria = Criteria::new().filter("material_ids", Some(ids(1..=8)));
	let options =
		QueryOptions { chunk_size: Some(4), num_chunks: Some(1), ..Default::default() };
	let result = rester.query(criteria, None, &options).await.expect("Query failed.");

	// The caller asked for four documents; the server only holds three.
	assert_eq!(result.data.len(), 3);
	assert_eq!(result.meta.shortfall, Some(1));
}

#[tokio::test]
async fn missing_route_maps_to_a_rest_error() {
	let server = TestServer::spawn_single("summary", summary_docs(3))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::THERMO).expect("Failed to build rester.");
	let err = rester
		.query(Criteria::new().filter("formula", Some("SiO2")), None, &QueryOptions::default())
		.await
		.expect_err("Expected an error.");

	match err {
		Error::Rest { status, message, .. } => {
			assert_eq!(status, 404);
			assert!(message.contains("not found"), "message was {message:?}");
		},
		other => panic!("Expected Error::Rest, got {other:?}"),
	}
}

#[tokio::test]
async fn unsupported_parameter_soft_fails_to_an_empty_result() {
	let server = TestServer::spawn_single("summary", summary_docs(5))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	let criteria = Criteria::new().filter("voltage", Some("1.5"));
	let result =
		rester.query(criteria, None, &QueryOptions::default()).await.expect("Query failed.");

	assert!(result.data.is_empty());
	assert_eq!(result.meta.total_doc, Some(0));
}

#[tokio::test]
async fn count_reads_the_server_subtotal() {
	let server = TestServer::spawn_single("summary", summary_docs(30))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	let criteria = Criteria::new().filter("formula", Some("SiO2"));
	let total = rester.count(criteria).await.expect("Count failed.");

	assert_eq!(total, 15);
	// One one-document page is enough.
	assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn fetches_a_single_document_by_id() {
	let server = TestServer::spawn_single("summary", summary_docs(10))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	let doc = rester
		.get_data_by_id::<SummaryDoc>("mp-5", Some(&["material_id", "band_gap"]))
		.await
		.expect("Lookup failed.");

	assert_eq!(doc.doc().material_id.as_deref(), Some("mp-5"));
	assert!(doc.field("band_gap").is_ok());

	// A field outside the projection fails loudly instead of reading as null.
	let err = doc.field("nsites").expect_err("Expected an error.");

	assert!(matches!(err, mprest_domain::Error::FieldNotRequested { .. }));
	assert!(doc.fields_not_requested().contains(&"nsites"));
}

#[tokio::test]
async fn missing_document_id_is_an_error() {
	let server = TestServer::spawn_single("summary", summary_docs(3))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	let err = rester
		.get_data_by_id::<SummaryDoc>("mp-999", None)
		.await
		.expect_err("Expected an error.");

	assert!(err.to_string().contains("No result for record mp-999"));
}

#[tokio::test]
async fn malformed_ids_are_rejected_before_any_request() {
	let server = TestServer::spawn_single("summary", summary_docs(3))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	let err = rester
		.get_data_by_id::<SummaryDoc>("not-an-id", None)
		.await
		.expect_err("Expected an error.");

	assert!(matches!(err, Error::Domain(mprest_domain::Error::InvalidId { .. })));
	assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn search_binds_typed_documents() {
	let server = TestServer::spawn_single("summary", summary_docs(10))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	let args = [(
		"material_ids",
		FilterValue::List(vec!["mp-1".to_string(), "mp-2".to_string()]),
	)];
	let docs = rester
		.search::<SummaryDoc>(&args, Some(&["material_id", "band_gap"]), &QueryOptions::default())
		.await
		.expect("Search failed.");

	assert_eq!(docs.len(), 2);

	for doc in &docs {
		assert!(doc.doc().band_gap.is_some());
		assert!(doc.doc().material_id.is_some());
		assert!(doc.fields_not_requested().contains(&"volume"));
	}
}

#[tokio::test]
async fn zero_chunk_size_is_a_configuration_error() {
	let server = TestServer::spawn_single("summary", summary_docs(3))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	let options = QueryOptions { chunk_size: Some(0), ..Default::default() };
	let err = rester
		.query(Criteria::new().filter("formula", Some("SiO2")), None, &options)
		.await
		.expect_err("Expected an error.");

	assert!(matches!(err, Error::Config { .. }));

	let options = QueryOptions { num_chunks: Some(0), ..Default::default() };
	let err = rester
		.query(Criteria::new().filter("formula", Some("SiO2")), None, &options)
		.await
		.expect_err("Expected an error.");

	assert!(matches!(err, Error::Config { .. }));
}
