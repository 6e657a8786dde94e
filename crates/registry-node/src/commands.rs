//! # JSON-Lines Command Protocol
//!
//! One JSON object per line in, one per line out. Requests are externally
//! tagged by operation name:
//!
//! ```text
//! {"register":{"caller":"0x..","name":"alice","signing_key":"0x..","stake_amount":1000000}}
//! {"deactivate":{"caller":"0x.."}}
//! "audit_custody"
//! ```
//!
//! Replies are `{"ok": <value>}` or `{"error": {"kind": "..", "message": ".."}}`.

use ar_02_identity_registry::{
    CustodyReport, EventRecord, Identity, IdentityKey, IdentityRegistryApi, RegistrationRequest,
    RegistryError, RegistryParams, SignatureCheck, Vouch,
};
use serde::{Deserialize, Serialize};
use shared_types::{decode_hex, Address, Amount, Hash};

/// Default page size for `events_since`.
pub const DEFAULT_EVENT_LIMIT: usize = 100;

fn default_event_limit() -> usize {
    DEFAULT_EVENT_LIMIT
}

/// A request read from the command stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Register {
        #[serde(with = "shared_types::hex_bytes")]
        caller: Address,
        name: String,
        #[serde(default)]
        metadata_pointer: String,
        #[serde(with = "shared_types::hex_bytes")]
        signing_key: Address,
        stake_amount: Amount,
    },
    LinkPlatform {
        #[serde(with = "shared_types::hex_bytes")]
        caller: Address,
        platform: String,
    },
    UpdateSigningKey {
        #[serde(with = "shared_types::hex_bytes")]
        caller: Address,
        #[serde(with = "shared_types::hex_bytes")]
        signing_key: Address,
    },
    Deactivate {
        #[serde(with = "shared_types::hex_bytes")]
        caller: Address,
    },
    Reactivate {
        #[serde(with = "shared_types::hex_bytes")]
        caller: Address,
    },
    WithdrawStake {
        #[serde(with = "shared_types::hex_bytes")]
        caller: Address,
    },
    Vouch {
        #[serde(with = "shared_types::hex_bytes")]
        caller: Address,
        identity_key: IdentityKey,
        amount: Amount,
    },
    WithdrawVouch {
        #[serde(with = "shared_types::hex_bytes")]
        caller: Address,
        identity_key: IdentityKey,
    },
    VerifySignature {
        identity_key: IdentityKey,
        #[serde(with = "shared_types::hex_bytes")]
        digest: Hash,
        /// `0x` hex of the 65-byte `r || s || v` signature.
        signature: String,
    },
    GetIdentity {
        identity_key: IdentityKey,
    },
    IdentityOf {
        #[serde(with = "shared_types::hex_bytes")]
        owner: Address,
    },
    GetLinkedPlatforms {
        identity_key: IdentityKey,
    },
    GetVouchCount {
        identity_key: IdentityKey,
    },
    GetVouches {
        identity_key: IdentityKey,
    },
    IsActive {
        identity_key: IdentityKey,
    },
    Params,
    EventsSince {
        #[serde(default)]
        after: u64,
        #[serde(default = "default_event_limit")]
        limit: usize,
    },
    AuditCustody,
    SetMinStake {
        #[serde(with = "shared_types::hex_bytes")]
        caller: Address,
        amount: Amount,
    },
    SetDeactivationCooldown {
        #[serde(with = "shared_types::hex_bytes")]
        caller: Address,
        seconds: u64,
    },
    BalanceOf {
        #[serde(with = "shared_types::hex_bytes")]
        holder: Address,
    },
}

/// Successful result payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Done,
    IdentityKey(IdentityKey),
    Amount(Amount),
    Flag(bool),
    Count(usize),
    Identity(Option<Identity>),
    Owner(Option<IdentityKey>),
    Platforms(Vec<String>),
    Vouches(Vec<Vouch>),
    Params(RegistryParams),
    Events(Vec<EventRecord>),
    Custody(CustodyReport),
    Signature(SignatureReport),
}

/// Signature verification outcome as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureReport {
    pub valid: bool,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovered: Option<String>,
}

impl From<SignatureCheck> for SignatureReport {
    fn from(check: SignatureCheck) -> Self {
        match check {
            SignatureCheck::Valid => SignatureReport {
                valid: true,
                outcome: "valid",
                recovered: None,
            },
            SignatureCheck::IdentityNotFound => SignatureReport {
                valid: false,
                outcome: "identity_not_found",
                recovered: None,
            },
            SignatureCheck::SignerMismatch { recovered } => SignatureReport {
                valid: false,
                outcome: "signer_mismatch",
                recovered: Some(shared_types::to_hex(&recovered)),
            },
            SignatureCheck::Malformed => SignatureReport {
                valid: false,
                outcome: "malformed",
                recovered: None,
            },
        }
    }
}

/// Error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReply {
    pub kind: String,
    pub message: String,
}

impl ErrorReply {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: "InvalidRequest".to_string(),
            message: message.into(),
        }
    }
}

impl From<RegistryError> for ErrorReply {
    fn from(err: RegistryError) -> Self {
        Self {
            kind: format!("{:?}", err.kind()),
            message: err.to_string(),
        }
    }
}

/// One line of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Ok(Reply),
    Error(ErrorReply),
}

impl<E: Into<ErrorReply>> From<Result<Reply, E>> for Response {
    fn from(result: Result<Reply, E>) -> Self {
        match result {
            Ok(reply) => Response::Ok(reply),
            Err(e) => Response::Error(e.into()),
        }
    }
}

/// Run a registry command against the API.
///
/// `BalanceOf` is not a registry operation and is answered by the host.
pub fn dispatch<A>(api: &A, command: Command) -> Response
where
    A: IdentityRegistryApi + ?Sized,
{
    let result: Result<Reply, ErrorReply> = match command {
        Command::Register {
            caller,
            name,
            metadata_pointer,
            signing_key,
            stake_amount,
        } => api
            .register(
                caller,
                RegistrationRequest {
                    name,
                    metadata_pointer,
                    signing_key,
                    stake_amount,
                },
            )
            .map(Reply::IdentityKey)
            .map_err(Into::into),
        Command::LinkPlatform { caller, platform } => api
            .link_platform(caller, platform)
            .map(|_| Reply::Done)
            .map_err(Into::into),
        Command::UpdateSigningKey {
            caller,
            signing_key,
        } => api
            .update_signing_key(caller, signing_key)
            .map(|_| Reply::Done)
            .map_err(Into::into),
        Command::Deactivate { caller } => api
            .deactivate(caller)
            .map(|_| Reply::Done)
            .map_err(Into::into),
        Command::Reactivate { caller } => api
            .reactivate(caller)
            .map(|_| Reply::Done)
            .map_err(Into::into),
        Command::WithdrawStake { caller } => api
            .withdraw_stake(caller)
            .map(Reply::Amount)
            .map_err(Into::into),
        Command::Vouch {
            caller,
            identity_key,
            amount,
        } => api
            .vouch(caller, identity_key, amount)
            .map(|_| Reply::Done)
            .map_err(Into::into),
        Command::WithdrawVouch {
            caller,
            identity_key,
        } => api
            .withdraw_vouch(caller, identity_key)
            .map(|_| Reply::Done)
            .map_err(Into::into),
        Command::VerifySignature {
            identity_key,
            digest,
            signature,
        } => decode_hex(&signature)
            .map_err(|e| ErrorReply::invalid_request(format!("signature: {e}")))
            .map(|bytes| {
                let check = api.verify_signature_detailed(&identity_key, &digest, &bytes);
                Reply::Signature(check.into())
            }),
        Command::GetIdentity { identity_key } => {
            Ok(Reply::Identity(api.get_identity(&identity_key)))
        }
        Command::IdentityOf { owner } => Ok(Reply::Owner(api.identity_of(&owner))),
        Command::GetLinkedPlatforms { identity_key } => {
            Ok(Reply::Platforms(api.get_linked_platforms(&identity_key)))
        }
        Command::GetVouchCount { identity_key } => {
            Ok(Reply::Count(api.get_vouch_count(&identity_key)))
        }
        Command::GetVouches { identity_key } => Ok(Reply::Vouches(api.get_vouches(&identity_key))),
        Command::IsActive { identity_key } => Ok(Reply::Flag(api.is_active(&identity_key))),
        Command::Params => Ok(Reply::Params(api.params())),
        Command::EventsSince { after, limit } => Ok(Reply::Events(api.events_since(after, limit))),
        Command::AuditCustody => Ok(Reply::Custody(api.audit_custody())),
        Command::SetMinStake { caller, amount } => api
            .set_min_stake(caller, amount)
            .map(|_| Reply::Done)
            .map_err(Into::into),
        Command::SetDeactivationCooldown { caller, seconds } => api
            .set_deactivation_cooldown(caller, seconds)
            .map(|_| Reply::Done)
            .map_err(Into::into),
        Command::BalanceOf { .. } => Err(ErrorReply::invalid_request(
            "balance_of is answered by the host",
        )),
    };
    result.into()
}
