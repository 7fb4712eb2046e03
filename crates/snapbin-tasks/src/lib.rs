// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Asynchronous delete/expire task pipeline for the snapbin image host.
//!
//! Decouples image deletion from the HTTP request path: producers push
//! serialized tasks onto per-kind FIFO queues, two worker loops pop and
//! execute the side effects (file removal plus row mutation), and every
//! state transition is mirrored into a TTL'd status store and, on terminal
//! transitions, broadcast on a per-kind result channel.
//!
//! Delivery is at-least-once with idempotent side effects; a task popped by
//! a crashing worker is lost (retry covers failures, not crashes).

pub mod backend;
pub mod keys;
pub mod memory;
pub mod producer;
pub mod redis_backend;
pub mod scanner;
pub mod worker;

pub use backend::TaskBackend;
pub use memory::MemoryBackend;
pub use producer::TaskProducer;
pub use redis_backend::RedisBackend;
pub use scanner::ExpiryScanner;
pub use worker::TaskWorker;
