//! rblnservices protobuf messages
//!
//! Only the fields the collector reads are declared; prost skips the
//! rest on decode.

/// Request body for parameterless RPCs
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Empty {}

/// A device as listed by `GetServiceableDeviceList`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Device {
    /// Hex PCI device id without prefix
    #[prost(string, tag = "1")]
    pub dev_id: ::prost::alloc::string::String,
}

/// Response of `GetVersion`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VersionInfo {
    /// Kernel driver version
    #[prost(string, tag = "1")]
    pub drv_version: ::prost::alloc::string::String,
}

impl From<&Device> for crate::device::Device {
    fn from(device: &Device) -> Self {
        crate::device::Device::new(device.dev_id.clone())
    }
}

impl From<&crate::device::Device> for Device {
    fn from(device: &crate::device::Device) -> Self {
        Self {
            dev_id: device.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_device_decodes_dev_id() {
        let wire = Device {
            dev_id: "1020".to_string(),
        }
        .encode_to_vec();

        let decoded = Device::decode(wire.as_slice()).unwrap();
        assert_eq!(crate::device::Device::from(&decoded).id, "1020");
    }

    #[test]
    fn test_version_request_carries_device_id() {
        let request = Device::from(&crate::device::Device::new("1221"));
        let decoded = Device::decode(request.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.dev_id, "1221");
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        // field 7, varint 3, ahead of dev_id
        let mut wire = vec![0x38, 0x03];
        wire.extend(
            Device {
                dev_id: "1220".to_string(),
            }
            .encode_to_vec(),
        );

        let decoded = Device::decode(wire.as_slice()).unwrap();
        assert_eq!(decoded.dev_id, "1220");
    }
}
