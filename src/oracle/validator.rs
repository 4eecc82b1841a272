use ethers::types::{Address, Signature};
use std::str::FromStr;
use tracing::{debug, warn};
use crate::data::types::OracleResponse;
use crate::error::{OracleError, Result};
use crate::monitoring::metrics;

/// Default number of valid oracle signatures required
pub const DEFAULT_QUORUM: usize = 3;

/// Drop unsigned responses and enforce the quorum.
///
/// A response with a missing or blank signature is discarded silently. If
/// fewer than `quorum` responses remain the whole batch is rejected; there
/// is no partial aggregation and no retry.
pub fn validate(responses: &[OracleResponse], quorum: usize) -> Result<Vec<OracleResponse>> {
    let valid: Vec<OracleResponse> = responses
        .iter()
        .filter(|r| {
            let signed = r.is_signed();
            if !signed {
                debug!("Dropping unsigned response from {}", r.oracle_address);
            }
            signed
        })
        .cloned()
        .collect();

    check_quorum(valid, quorum)
}

/// Like [`validate`], but a response also has to carry a signature that
/// recovers to its own `oracle_address`.
pub fn validate_verified(responses: &[OracleResponse], quorum: usize) -> Result<Vec<OracleResponse>> {
    let valid: Vec<OracleResponse> = responses
        .iter()
        .filter(|r| r.is_signed() && verify_signature(r))
        .cloned()
        .collect();

    check_quorum(valid, quorum)
}

/// Check that the response's signature was produced by its oracle address
/// over [`OracleResponse::signing_payload`].
pub fn verify_signature(response: &OracleResponse) -> bool {
    let Some(raw) = response.signature.as_deref() else {
        return false;
    };

    let signature = match Signature::from_str(raw.trim()) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Malformed signature from {}: {}", response.oracle_address, e);
            return false;
        }
    };
    let address = match Address::from_str(response.oracle_address.trim()) {
        Ok(addr) => addr,
        Err(e) => {
            debug!("Malformed oracle address {}: {}", response.oracle_address, e);
            return false;
        }
    };

    match signature.verify(response.signing_payload(), address) {
        Ok(()) => true,
        Err(e) => {
            debug!("Signature from {} rejected: {}", response.oracle_address, e);
            false
        }
    }
}

fn check_quorum(valid: Vec<OracleResponse>, quorum: usize) -> Result<Vec<OracleResponse>> {
    if valid.len() < quorum {
        warn!("Oracle quorum not reached: {} valid, {} required", valid.len(), quorum);
        metrics::record_quorum_failure();
        return Err(OracleError::QuorumNotReached {
            valid: valid.len(),
            required: quorum,
        });
    }
    Ok(valid)
}
