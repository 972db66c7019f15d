//! Integration test suite for Campus-Corpus

mod crawl_tests;
