use std::rc::Rc;

use crate::abi::Abi;
use crate::encoding;
use crate::object::Object;

use super::rpc::RpcClient;
use super::EthError;

/// An ABI bound to a deployed address and a client, ready for read-only
/// calls.
pub struct BoundContract {
    abi: Rc<Abi>,
    client: RpcClient,
    address: String,
}

impl BoundContract {
    pub fn new(abi: Rc<Abi>, client: RpcClient, address: String) -> Self {
        Self {
            abi,
            client,
            address,
        }
    }

    fn pack(&self, method: &str, args: &[Object]) -> Result<Vec<u8>, EthError> {
        let function = self
            .abi
            .functions
            .get(method)
            .ok_or_else(|| EthError::new(format!("method {} not found", method)))?;

        let mut data = function.selector().to_vec();
        data.extend(encoding::pack(&function.inputs, args)?);
        Ok(data)
    }

    fn unpack(&self, method: &str, data: &[u8]) -> Result<Vec<Object>, EthError> {
        let function = self
            .abi
            .functions
            .get(method)
            .ok_or_else(|| EthError::new(format!("method {} not found", method)))?;

        Ok(encoding::unpack(&function.outputs, data)?)
    }

    /// `eth_call` a method: encode the arguments, send, decode the outputs.
    pub fn call(&self, method: &str, args: &[Object]) -> Result<Vec<Object>, EthError> {
        let data = self
            .pack(method, args)
            .map_err(|e| EthError::new(format!("failed to pack: {}", e)))?;

        let output = self
            .client
            .call(&self.address, &data)
            .map_err(|e| EthError::new(format!("call failed: {}", e)))?;

        self.unpack(method, &output)
            .map_err(|e| EthError::new(format!("failed to unpack: {}", e)))
    }
}
