// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of polymorphic API objects
//!
//! Several API objects come in a closed-but-extensible set of shapes: a
//! single JSON property (the *discriminator*, e.g. `sourceType`) names the
//! shape, and the remaining properties depend on it.  Each such set of shapes
//! is a *family*, declared with
//! [`polymorphic_family!`](crate::polymorphic_family) and represented as a
//! Rust enum with one variant per known shape plus an `Unknown` variant.
//!
//! Decoding happens in two passes over the same bytes:
//!
//! 1. [`Envelope::parse`] reads the object generically, extracting the
//!    discriminator and the family's common ("base") fields.  Anything that
//!    isn't a JSON object, or that lacks a mandatory base field, fails here
//!    with [`DecodeError::MalformedEnvelope`].
//! 2. [`Envelope::resolve`] looks the discriminator up in the family's
//!    registry.  A match re-decodes the *original* bytes into the concrete
//!    shape, failing with [`DecodeError::MalformedVariant`] if that shape's
//!    own requirements aren't met.  No match (or no discriminator at all)
//!    yields the family's `Unknown` variant carrying only the base fields.
//!
//! The second case is not an error: a server may introduce shapes that this
//! client predates, and the fields all shapes share must still be readable.

use serde::de::DeserializeOwned;
use serde::de::Error as _;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde_json::value::RawValue;
use serde_json::Map;
use serde_json::Value;
use std::fmt;

/// Decodes the original bytes of an object into one concrete variant.
pub type VariantDecoder<F> = fn(&[u8]) -> Result<F, serde_json::Error>;

/// One entry of a family's registry: a discriminator literal and the decoder
/// for the shape it selects.
pub struct VariantEntry<F: 'static> {
    pub discriminator: &'static str,
    pub decode: VariantDecoder<F>,
}

impl<F> fmt::Debug for VariantEntry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantEntry")
            .field("discriminator", &self.discriminator)
            .finish_non_exhaustive()
    }
}

/// A polymorphic family of API objects
///
/// This is normally implemented by
/// [`polymorphic_family!`](crate::polymorphic_family) rather than by hand.
pub trait PolymorphicFamily: Sized + 'static {
    /// Name of the family, used in error messages.
    const NAME: &'static str;

    /// Name of the JSON property holding the discriminator.
    const DISCRIMINATOR: &'static str;

    /// Fields common to every variant of the family.
    type Base: DeserializeOwned + Serialize;

    /// Known discriminator literals and their decoders.  Fixed at compile
    /// time.
    const REGISTRY: &'static [VariantEntry<Self>];

    /// Wraps a value whose discriminator was absent or not in the registry.
    fn fallback(unknown: Unknown<Self::Base>) -> Self;

    /// Returns the discriminator literal this value is encoded with, if any.
    fn discriminator(&self) -> Option<&str>;

    /// Returns the fields common to every variant.
    fn base(&self) -> &Self::Base;

    /// Returns whether this value is one of the shapes in the registry.
    fn is_known(&self) -> bool;

    /// Decodes one member of this family from raw JSON bytes.
    fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        decode::<Self>(raw)
    }

    /// Returns the registry entry for `discriminator`, if there is one.
    ///
    /// Matching is exact and case-sensitive.
    fn lookup(discriminator: &str) -> Option<&'static VariantEntry<Self>> {
        Self::REGISTRY.iter().find(|entry| entry.discriminator == discriminator)
    }
}

/// A member of a family whose discriminator this client does not recognize
/// (or which carried no discriminator at all)
///
/// Only the family's common fields are available.  The unrecognized
/// discriminator literal is kept so that the value re-encodes as it arrived.
///
/// `discriminator` must not be one of the family's registered literals:
/// such a value would re-encode as a known variant missing its own fields.
/// Decoding never produces one; build values with [`Unknown::new`] to get
/// the same guarantee.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Unknown<B> {
    pub discriminator: Option<String>,
    pub base: B,
}

impl<B> Unknown<B> {
    /// Returns `None` if `discriminator` is registered in family `F`.
    pub fn new<F>(discriminator: Option<String>, base: B) -> Option<Self>
    where
        F: PolymorphicFamily<Base = B>,
    {
        match discriminator.as_deref() {
            Some(literal) if F::lookup(literal).is_some() => None,
            _ => Some(Unknown { discriminator, base }),
        }
    }
}

/// Base fields for families whose variants share nothing beyond the
/// discriminator.
#[derive(
    Clone,
    Debug,
    Default,
    Deserialize,
    Eq,
    PartialEq,
    Serialize,
    schemars::JsonSchema,
)]
pub struct NoCommonFields {}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The bytes were not a JSON object, or the family's common fields could
    /// not be read from it.
    #[error("malformed {family} envelope: {source}")]
    MalformedEnvelope {
        family: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The discriminator named a known variant, but the object does not
    /// satisfy that variant's shape.
    #[error("malformed {family} variant {discriminator:?}: {source}")]
    MalformedVariant {
        family: &'static str,
        discriminator: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Returns the name of the family that failed to decode.
    pub fn family(&self) -> &'static str {
        match self {
            DecodeError::MalformedEnvelope { family, .. }
            | DecodeError::MalformedVariant { family, .. } => family,
        }
    }
}

/// The first-pass decode of a polymorphic object: the original bytes, the
/// discriminator (if present), and the family's common fields.
pub struct Envelope<'a, F: PolymorphicFamily> {
    raw: &'a [u8],
    discriminator: Option<String>,
    base: F::Base,
}

impl<'a, F: PolymorphicFamily> Envelope<'a, F> {
    /// Reads the discriminator and common fields of `raw`.
    pub fn parse(raw: &'a [u8]) -> Result<Self, DecodeError> {
        let malformed = |source| DecodeError::MalformedEnvelope {
            family: F::NAME,
            source,
        };

        let object: Map<String, Value> =
            serde_json::from_slice(raw).map_err(malformed)?;

        let discriminator = match object.get(F::DISCRIMINATOR) {
            None | Some(Value::Null) => None,
            Some(Value::String(literal)) => Some(literal.clone()),
            Some(other) => {
                return Err(malformed(serde_json::Error::custom(format!(
                    "discriminator `{}` must be a string, found {}",
                    F::DISCRIMINATOR,
                    json_type_name(other),
                ))));
            }
        };

        let base = serde_json::from_value(Value::Object(object))
            .map_err(malformed)?;

        Ok(Envelope { raw, discriminator, base })
    }

    /// Returns the discriminator literal, if one was present.
    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator.as_deref()
    }

    /// Returns the common fields.
    pub fn base(&self) -> &F::Base {
        &self.base
    }

    /// Returns the bytes this envelope was parsed from.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Produces the concrete variant named by the discriminator, or the
    /// family's fallback if the discriminator is absent or unrecognized.
    pub fn resolve(self) -> Result<F, DecodeError> {
        let entry = match self.discriminator.as_deref() {
            Some(literal) => F::lookup(literal),
            None => None,
        };

        match entry {
            Some(entry) => (entry.decode)(self.raw).map_err(|source| {
                DecodeError::MalformedVariant {
                    family: F::NAME,
                    discriminator: entry.discriminator,
                    source,
                }
            }),
            None => Ok(F::fallback(Unknown {
                discriminator: self.discriminator,
                base: self.base,
            })),
        }
    }
}

/// Decodes one member of the family `F` from raw JSON bytes.
pub fn decode<F: PolymorphicFamily>(raw: &[u8]) -> Result<F, DecodeError> {
    Envelope::<F>::parse(raw)?.resolve()
}

/// Serializes `body` as a JSON object with the discriminator property
/// `field` set to `literal`.
///
/// `body` must serialize as an object.  The discriminator is left out when
/// `literal` is `None`.
pub fn serialize_tagged<S, T>(
    serializer: S,
    field: &'static str,
    literal: Option<&str>,
    body: &T,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    let mut object = match serde_json::to_value(body)
        .map_err(<S::Error as serde::ser::Error>::custom)?
    {
        Value::Object(object) => object,
        other => {
            return Err(<S::Error as serde::ser::Error>::custom(format!(
                "polymorphic body must serialize as an object, found {}",
                json_type_name(&other),
            )));
        }
    };
    if let Some(literal) = literal {
        object.insert(field.to_owned(), Value::String(literal.to_owned()));
    }
    object.serialize(serializer)
}

/// Deserializes a member of the family `F` by capturing the object's raw
/// bytes and running them through [`decode`].
///
/// Only works with `serde_json` deserializers, which is the only format the
/// API speaks.  A [`DecodeError`] is reported through `D::Error::custom`, so
/// callers see its message but not its variant.
pub fn deserialize_family<'de, D, F>(deserializer: D) -> Result<F, D::Error>
where
    D: Deserializer<'de>,
    F: PolymorphicFamily,
{
    let raw = Box::<RawValue>::deserialize(deserializer)?;
    decode(raw.get().as_bytes()).map_err(D::Error::custom)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod test {
    use super::DecodeError;
    use super::Envelope;
    use super::PolymorphicFamily;
    use crate::polymorphic_family;
    use assert_matches::assert_matches;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde::Serialize;

    #[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct SourceBase {
        #[serde(skip_serializing_if = "Option::is_none")]
        operating_system: Option<String>,
    }

    #[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct ImageSourceViaImage {
        #[serde(flatten)]
        base: SourceBase,
        image_id: String,
        #[serde(
            rename = "bootVolumeSizeInGBs",
            skip_serializing_if = "Option::is_none"
        )]
        boot_volume_size_in_gbs: Option<i64>,
    }

    #[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct ImageSourceViaUri {
        #[serde(flatten)]
        base: SourceBase,
        source_uri: String,
    }

    polymorphic_family! {
        #[derive(Clone, Debug, PartialEq)]
        enum Source {
            discriminator = "sourceType",
            base = SourceBase,
            variants = {
                "image" => Image(ImageSourceViaImage),
                "uri" => Uri(ImageSourceViaUri),
            }
        }
    }

    #[test]
    fn test_known_discriminator() {
        let raw = br#"{"sourceType":"image","imageId":"ocid1.image.A","bootVolumeSizeInGBs":50}"#;
        let source = Source::decode(raw).unwrap();
        assert_eq!(
            source,
            Source::Image(ImageSourceViaImage {
                base: SourceBase { operating_system: None },
                image_id: String::from("ocid1.image.A"),
                boot_volume_size_in_gbs: Some(50),
            })
        );
        assert_eq!(source.discriminator(), Some("image"));
        assert!(source.is_known());
    }

    #[test]
    fn test_unknown_discriminator_falls_back() {
        let raw = br#"{"sourceType":"futureType","operatingSystem":"Linux"}"#;
        let source = Source::decode(raw).unwrap();
        let Source::Unknown(unknown) = &source else {
            panic!("expected fallback, got {:?}", source);
        };
        assert_eq!(unknown.discriminator.as_deref(), Some("futureType"));
        assert_eq!(source.base().operating_system.as_deref(), Some("Linux"));
        assert!(!source.is_known());
    }

    #[test]
    fn test_missing_discriminator_falls_back() {
        let inputs: [&[u8]; 2] =
            [br#"{"imageId":"x"}"#, br#"{"sourceType":null}"#];
        for raw in inputs {
            let source = Source::decode(raw).unwrap();
            assert_matches!(
                source,
                Source::Unknown(super::Unknown { discriminator: None, .. })
            );
        }
    }

    #[test]
    fn test_unknown_rejects_registered_discriminator() {
        let base = SourceBase { operating_system: None };
        assert!(super::Unknown::new::<Source>(
            Some(String::from("image")),
            base.clone()
        )
        .is_none());

        let unknown = super::Unknown::new::<Source>(
            Some(String::from("futureType")),
            base.clone(),
        )
        .unwrap();
        let encoded = serde_json::to_vec(&Source::Unknown(unknown)).unwrap();
        assert_matches!(
            Source::decode(&encoded).unwrap(),
            Source::Unknown(super::Unknown { discriminator: Some(d), .. })
                if d == "futureType"
        );

        // Case differs from the registered literal, so this is unknown.
        assert!(super::Unknown::new::<Source>(
            Some(String::from("Image")),
            base.clone()
        )
        .is_some());
        assert!(super::Unknown::new::<Source>(None, base).is_some());
    }

    #[test]
    fn test_discriminator_is_case_sensitive() {
        let raw = br#"{"sourceType":"Image","imageId":"x"}"#;
        let source = Source::decode(raw).unwrap();
        assert_eq!(source.discriminator(), Some("Image"));
        assert!(!source.is_known());
    }

    #[test]
    fn test_missing_variant_field() {
        let error = Source::decode(br#"{"sourceType":"image"}"#).unwrap_err();
        assert_matches!(
            error,
            DecodeError::MalformedVariant {
                family: "Source",
                discriminator: "image",
                ..
            }
        );
        assert!(error.to_string().contains("imageId"), "{}", error);
    }

    #[test]
    fn test_mistyped_variant_field() {
        let raw = br#"{"sourceType":"image","imageId":"x","bootVolumeSizeInGBs":"big"}"#;
        let error = Source::decode(raw).unwrap_err();
        assert_matches!(error, DecodeError::MalformedVariant { .. });
    }

    #[test]
    fn test_not_an_object() {
        let inputs: [&[u8]; 6] =
            [b"[]", b"17", b"\"image\"", b"null", b"{\"sourceType\":", b""];
        for raw in inputs {
            let error = Source::decode(raw).unwrap_err();
            assert_matches!(
                error,
                DecodeError::MalformedEnvelope { family: "Source", .. },
                "input {:?}",
                String::from_utf8_lossy(raw)
            );
        }
    }

    #[test]
    fn test_mistyped_base_field() {
        let raw = br#"{"sourceType":"futureType","operatingSystem":7}"#;
        let error = Source::decode(raw).unwrap_err();
        assert_matches!(error, DecodeError::MalformedEnvelope { .. });
    }

    #[test]
    fn test_non_string_discriminator() {
        let raw = br#"{"sourceType":1,"imageId":"x"}"#;
        let error = Source::decode(raw).unwrap_err();
        assert_matches!(error, DecodeError::MalformedEnvelope { .. });
        assert!(error.to_string().contains("must be a string"), "{}", error);
    }

    #[test]
    fn test_envelope_passes() {
        let raw = br#"{"sourceType":"uri","sourceUri":"https://example.com/img","operatingSystem":"Oracle Linux"}"#;
        let envelope = Envelope::<Source>::parse(raw).unwrap();
        assert_eq!(envelope.discriminator(), Some("uri"));
        assert_eq!(
            envelope.base().operating_system.as_deref(),
            Some("Oracle Linux")
        );
        assert_eq!(envelope.raw(), &raw[..]);

        let base = envelope.base().clone();
        let source = envelope.resolve().unwrap();
        assert_eq!(source.base(), &base);
        assert_matches!(source, Source::Uri(_));
    }

    #[test]
    fn test_reencode_restores_discriminator() {
        let raw = br#"{"sourceType":"image","imageId":"ocid1.image.A"}"#;
        let source = Source::decode(raw).unwrap();
        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "sourceType": "image",
                "imageId": "ocid1.image.A",
            })
        );

        let raw = br#"{"sourceType":"futureType","operatingSystem":"Linux"}"#;
        let source = Source::decode(raw).unwrap();
        let encoded = serde_json::to_vec(&source).unwrap();
        assert_eq!(Source::decode(&encoded).unwrap(), source);
    }

    #[test]
    fn test_nested_in_struct() {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Wrapper {
            source_details: Option<Source>,
        }

        let wrapper: Wrapper = serde_json::from_str(
            r#"{"sourceDetails":{"sourceType":"uri","sourceUri":"u"}}"#,
        )
        .unwrap();
        assert_matches!(wrapper.source_details, Some(Source::Uri(_)));

        let wrapper: Wrapper =
            serde_json::from_str(r#"{"sourceDetails":null}"#).unwrap();
        assert!(wrapper.source_details.is_none());

        let error = serde_json::from_str::<Wrapper>(
            r#"{"sourceDetails":{"sourceType":"image"}}"#,
        )
        .unwrap_err();
        assert!(error.to_string().contains("malformed Source variant"));
    }
}
