//! Ledger status report.

use tracing::info;

use scenefetch_core::{ActivationState, LedgerSummary};

/// Logs activated and downloaded assets.
pub fn log_status(summary: &LedgerSummary) {
    info!("===== Status Summary =====");
    info!("Total activated assets: {}", summary.activated.len());
    info!("  of which active: {}", summary.active_count());
    info!("Total downloaded assets: {}", summary.downloaded.len());

    if !summary.activated.is_empty() {
        info!("Activated assets:");
        for (key, state) in &summary.activated {
            info!("  - {}: {}", key, describe(*state));
        }
    }

    if !summary.downloaded.is_empty() {
        info!("Downloaded assets:");
        for key in &summary.downloaded {
            info!("  - {}", key);
        }
    }
    info!("==========================");
}

fn describe(state: ActivationState) -> &'static str {
    match state {
        ActivationState::Active => "active and ready for download",
        ActivationState::Requested => "activation in progress",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_states() {
        assert_eq!(describe(ActivationState::Active), "active and ready for download");
        assert_eq!(describe(ActivationState::Requested), "activation in progress");
    }
}
