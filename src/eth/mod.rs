pub mod artifacts;
pub mod contract;
pub mod ens;
pub mod rpc;

use std::fmt;

use crate::abi::AbiError;
use crate::encoding::EncodingError;
use rpc::RpcError;

#[derive(Debug)]
pub struct EthError {
    pub message: String,
}

impl EthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EthError {}

impl From<RpcError> for EthError {
    fn from(err: RpcError) -> Self {
        EthError::new(err.message)
    }
}

impl From<EncodingError> for EthError {
    fn from(err: EncodingError) -> Self {
        EthError::new(err.message)
    }
}

impl From<AbiError> for EthError {
    fn from(err: AbiError) -> Self {
        EthError::new(err.message)
    }
}
