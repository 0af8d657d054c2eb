//! bionews: collects biotech/pharma headlines from RSS/Atom feeds, drops
//! anything already published, and posts a daily markdown digest to a
//! GitHub repository.

pub mod article;
pub mod categorize;
pub mod config;
pub mod digest;
pub mod feed;
pub mod filter;
pub mod llm;
pub mod pipeline;
pub mod publish;
pub mod storage;
pub mod util;
