//! End-to-end tests that run the engine against an in-process broker.
