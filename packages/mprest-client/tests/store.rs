use mprest_client::{QueryOptions, Rester, routes};
use mprest_domain::SummaryDoc;
use mprest_testkit::{MemoryStore, TestServer, summary_docs, test_config};

const DB_VERSION: &str = "2026.07.1";

fn seeded_store() -> MemoryStore {
	let mut store = MemoryStore::new();

	// One line-delimited block with a deprecated entry, one single-document
	// object, and one object outside the collection prefix.
	store.insert(
		format!("summary/{DB_VERSION}/block-0.jsonl"),
		concat!(
			"{\"material_id\": \"mp-1\", \"band_gap\": 0.1, \"deprecated\": false}\n",
			"{\"material_id\": \"mp-2\", \"band_gap\": 0.2, \"deprecated\": true}\n",
			"{\"material_id\": \"mp-3\", \"band_gap\": 0.3, \"deprecated\": false}\n",
		),
	);
	store.insert(
		format!("summary/{DB_VERSION}/block-1.json"),
		"{\"material_id\": \"mp-4\", \"band_gap\": 0.4, \"deprecated\": false}",
	);
	store.insert(
		format!("thermo/{DB_VERSION}/block-0.json"),
		"{\"material_id\": \"mp-9\", \"deprecated\": false}",
	);

	store
}

#[tokio::test]
async fn filterless_uncapped_queries_take_the_store_path() {
	let server = TestServer::spawn_single("summary", summary_docs(50))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY)
		.expect("Failed to build rester.")
		.with_store(seeded_store(), DB_VERSION);
	let docs = rester
		.search::<SummaryDoc>(&[], None, &QueryOptions::default())
		.await
		.expect("Search failed.");

	// Deprecated documents are dropped; the thermo object is out of scope.
	assert_eq!(docs.len(), 3);
	assert!(docs.iter().all(|doc| doc.doc().deprecated == Some(false)));
	// The query endpoint was never touched.
	assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn store_path_projects_requested_fields() {
	let server = TestServer::spawn_single("summary", summary_docs(5))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY)
		.expect("Failed to build rester.")
		.with_store(seeded_store(), DB_VERSION);
	let docs = rester
		.search::<SummaryDoc>(&[], Some(&["material_id"]), &QueryOptions::default())
		.await
		.expect("Search failed.");

	assert_eq!(docs.len(), 3);

	for doc in &docs {
		assert!(doc.doc().material_id.is_some());
		assert!(doc.fields_not_requested().contains(&"band_gap"));
	}
}

#[tokio::test]
async fn page_capped_queries_stay_on_the_http_path() {
	let server = TestServer::spawn_single("summary", summary_docs(5))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY)
		.expect("Failed to build rester.")
		.with_store(seeded_store(), DB_VERSION);
	let options = QueryOptions { num_chunks: Some(1), chunk_size: Some(10), ..Default::default() };
	let docs = rester
		.search::<SummaryDoc>(&[], None, &options)
		.await
		.expect("Search failed.");

	assert_eq!(docs.len(), 5);
	assert!(server.hits() > 0);
}

#[tokio::test]
async fn filterless_queries_without_a_store_paginate_over_http() {
	let server = TestServer::spawn_single("summary", summary_docs(12))
		.await
		.expect("Failed to spawn test server.");
	let cfg = test_config(&server.endpoint());
	let rester = Rester::new(&cfg, routes::SUMMARY).expect("Failed to build rester.");
	let options = QueryOptions { chunk_size: Some(5), ..Default::default() };
	let docs = rester
		.search::<SummaryDoc>(&[], None, &options)
		.await
		.expect("Search failed.");

	assert_eq!(docs.len(), 12);
	assert!(server.hits() > 0);
}
