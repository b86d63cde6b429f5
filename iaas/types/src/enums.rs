// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! String-valued enumerations used across the API
//!
//! Each enumeration has a fixed table of known values.  Values outside the
//! table still parse, into the `Unknown` variant, so that responses from a
//! newer server don't fail to decode.  Requests are checked for `Unknown`
//! values before they are sent.

use std::fmt::Display;

/// Common behavior of the API's string-valued enumerations
pub trait StringEnum: Display + Sized + 'static {
    /// All known values, in the order the API documents them.
    fn values() -> &'static [Self];

    /// Returns the literal used on the wire.
    fn as_str(&self) -> &str;

    /// Returns whether this is one of the known values.
    fn is_known(&self) -> bool;

    /// Returns the known literals, comma-separated, for error messages.
    fn supported_values() -> String {
        Self::values()
            .iter()
            .map(|value| value.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

macro_rules! string_enum {
    (
        $(#[$attr:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_attr:meta])*
                $variant:ident = $literal:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(
            Clone,
            Debug,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            serde_with::DeserializeFromStr,
            serde_with::SerializeDisplay,
        )]
        pub enum $name {
            $(
                $(#[$variant_attr])*
                $variant,
            )+
            /// A value this client does not recognize.
            Unknown(String),
        }

        impl $name {
            const VALUES: &'static [$name] = &[$($name::$variant,)+];
        }

        impl $crate::enums::StringEnum for $name {
            fn values() -> &'static [$name] {
                Self::VALUES
            }

            fn as_str(&self) -> &str {
                match self {
                    $( $name::$variant => $literal, )+
                    $name::Unknown(literal) => literal.as_str(),
                }
            }

            fn is_known(&self) -> bool {
                !matches!(self, $name::Unknown(_))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(
                &self,
                f: &mut ::std::fmt::Formatter<'_>,
            ) -> ::std::fmt::Result {
                f.write_str($crate::enums::StringEnum::as_str(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::std::convert::Infallible;

            /// Known values match regardless of ASCII case; anything else is
            /// kept verbatim in `Unknown`.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::VALUES
                    .iter()
                    .find(|value| {
                        $crate::enums::StringEnum::as_str(*value)
                            .eq_ignore_ascii_case(s)
                    })
                    .cloned()
                    .unwrap_or_else(|| $name::Unknown(s.to_owned())))
            }
        }

        impl schemars::JsonSchema for $name {
            fn schema_name() -> String {
                String::from(stringify!($name))
            }

            fn json_schema(
                _: &mut schemars::r#gen::SchemaGenerator,
            ) -> schemars::schema::Schema {
                schemars::schema::SchemaObject {
                    instance_type: Some(
                        schemars::schema::InstanceType::String.into(),
                    ),
                    enum_values: Some(vec![
                        $( serde_json::Value::from($literal), )+
                    ]),
                    ..Default::default()
                }
                .into()
            }
        }
    };
}

string_enum! {
    /// Format of an image imported from object storage
    pub enum SourceImageType {
        Qcow2 = "QCOW2",
        Vmdk = "VMDK",
    }
}

string_enum! {
    /// How a VM's devices are presented to the guest
    pub enum LaunchMode {
        Native = "NATIVE",
        Emulated = "EMULATED",
        Paravirtualized = "PARAVIRTUALIZED",
        Custom = "CUSTOM",
    }
}

string_enum! {
    pub enum InstanceLifecycleState {
        Moving = "MOVING",
        Provisioning = "PROVISIONING",
        Running = "RUNNING",
        Starting = "STARTING",
        Stopping = "STOPPING",
        Stopped = "STOPPED",
        CreatingImage = "CREATING_IMAGE",
        Terminating = "TERMINATING",
        Terminated = "TERMINATED",
    }
}

string_enum! {
    pub enum ImageLifecycleState {
        Provisioning = "PROVISIONING",
        Importing = "IMPORTING",
        Available = "AVAILABLE",
        Exporting = "EXPORTING",
        Disabled = "DISABLED",
        Deleted = "DELETED",
    }
}

string_enum! {
    pub enum VolumeLifecycleState {
        Provisioning = "PROVISIONING",
        Restoring = "RESTORING",
        Available = "AVAILABLE",
        Terminating = "TERMINATING",
        Terminated = "TERMINATED",
        Faulty = "FAULTY",
    }
}

string_enum! {
    pub enum VolumeAttachmentLifecycleState {
        Attaching = "ATTACHING",
        Attached = "ATTACHED",
        Detaching = "DETACHING",
        Detached = "DETACHED",
    }
}

string_enum! {
    /// Encryption applied to iSCSI traffic between an instance and a volume
    pub enum EncryptionInTransitType {
        None = "NONE",
        BmEncryptionInTransit = "BM_ENCRYPTION_IN_TRANSIT",
    }
}

string_enum! {
    /// Which CIDRs of a VCN are advertised over a DRG attachment
    pub enum VcnRouteType {
        VcnCidrs = "VCN_CIDRS",
        SubnetCidrs = "SUBNET_CIDRS",
    }
}

string_enum! {
    pub enum DrgAttachmentLifecycleState {
        Attaching = "ATTACHING",
        Attached = "ATTACHED",
        Detaching = "DETACHING",
        Detached = "DETACHED",
    }
}
