use ethers::types::{Address, Log};
use log::{debug, warn};
use std::{collections::HashSet, sync::Arc};

use crate::chain::TokenChain;

/// Approximate holder count from recent Transfer recipients.
///
/// Only the last `window` blocks are scanned, so holders whose last transfer
/// predates the window are missed.
pub struct HolderEstimator<C> {
    chain: Arc<C>,
    window: u64,
    chunk_size: u64,
}

impl<C: TokenChain> HolderEstimator<C> {
    pub fn new(chain: Arc<C>, window: u64, chunk_size: u64) -> Self {
        Self {
            chain,
            window,
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn estimate(&self, token: Address) -> Option<u64> {
        let latest = match self.chain.block_number().await {
            Ok(block) => block,
            Err(e) => {
                warn!("Holder estimate for {:?} skipped: {}", token, e);
                return None;
            }
        };
        // `window` blocks ending at `latest`, inclusive
        let from = latest.saturating_sub(self.window.saturating_sub(1));

        let mut recipients = HashSet::new();
        for (start, end) in block_chunks(from, latest, self.chunk_size) {
            match self.chain.transfer_logs(token, start, end).await {
                Ok(logs) => collect_recipients(&logs, &mut recipients),
                Err(e) => warn!("Transfer logs {}..={} for {:?} failed: {}", start, end, token, e),
            }
        }

        debug!(
            "{:?}: {} distinct recipients in blocks {}..={}",
            token,
            recipients.len(),
            from,
            latest
        );
        Some(recipients.len() as u64)
    }
}

/// Inclusive `[start, end]` ranges of at most `size` blocks covering `from..=to`.
pub fn block_chunks(from: u64, to: u64, size: u64) -> Vec<(u64, u64)> {
    let size = size.max(1);
    let mut chunks = Vec::new();
    let mut start = from;
    while start <= to {
        let end = start.saturating_add(size - 1).min(to);
        chunks.push((start, end));
        if end == u64::MAX {
            break;
        }
        start = end + 1;
    }
    chunks
}

/// Recipient is the second indexed topic; mints/burns to the zero address are skipped.
pub fn collect_recipients(logs: &[Log], recipients: &mut HashSet<Address>) {
    for log in logs {
        if let Some(topic) = log.topics.get(2) {
            let to = Address::from(*topic);
            if !to.is_zero() {
                recipients.insert(to);
            }
        }
    }
}
