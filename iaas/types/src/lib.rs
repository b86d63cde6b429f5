// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request and response bodies for the infrastructure API
//!
//! Most of this crate is plain data: structs mirroring the API's JSON bodies
//! (see [`compute`], [`block_storage`] and [`networking`]) and string-valued
//! enumerations ([`enums`]).  The interesting part is [`envelope`], which
//! decodes the API's *polymorphic* objects: values whose shape depends on a
//! discriminator property, and which must keep decoding when the server
//! starts sending shapes this client has never heard of.

pub mod block_storage;
pub mod compute;
pub mod enums;
pub mod envelope;
pub mod family;
pub mod networking;

pub use envelope::decode;
pub use envelope::DecodeError;
pub use envelope::Envelope;
pub use envelope::PolymorphicFamily;
pub use envelope::Unknown;
pub use enums::StringEnum;

#[doc(hidden)]
pub mod __private {
    pub use schemars;
    pub use schemars::r#gen::SchemaGenerator;
    pub use serde;
    pub use serde_json;
}
