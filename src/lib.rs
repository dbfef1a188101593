// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) parses the command line and drives the flow.
//
// Module responsibilities:
// - `api`: Encapsulates HTTP interactions with the document-intelligence
//   service (authenticate, config upload, document upload/indexing,
//   information extraction) behind the `RemoteService` trait.
// - `cache`: A small cache-store abstraction (key = step name, value =
//   last JSON response) with file and in-memory backings.
// - `flow`: The sequential authenticate -> upload -> extract orchestration,
//   each step short-circuited by the cache.
//
// Keeping this separation makes it possible to test the flow against a
// mock remote service and an in-memory cache.
pub mod api;
pub mod cache;
pub mod flow;
