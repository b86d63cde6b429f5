// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Declaring polymorphic families
//!
//! See [`polymorphic_family!`](crate::polymorphic_family).

use schemars::r#gen::SchemaGenerator;
use schemars::schema::InstanceType;
use schemars::schema::Schema;
use schemars::schema::SchemaObject;

/// Declares a polymorphic family: an enum with one tuple variant per known
/// shape, plus an `Unknown` variant for shapes this client doesn't recognize.
///
/// ```ignore
/// polymorphic_family! {
///     /// Where a volume's initial contents come from
///     #[derive(Clone, Debug, PartialEq)]
///     pub enum VolumeSourceDetails {
///         discriminator = "type",
///         base = NoCommonFields,
///         variants = {
///             "volume" => Volume(VolumeSourceFromVolumeDetails),
///             "volumeBackup" =>
///                 VolumeBackup(VolumeSourceFromVolumeBackupDetails),
///         }
///     }
/// }
/// ```
///
/// Every shape must have a `base` field of the family's base type, normally
/// declared `#[serde(flatten)]`, so that common fields are read the same way
/// from any variant.  Shapes must implement `Deserialize`, `Serialize` (as an
/// object) and `JsonSchema`.
///
/// The macro generates the [`PolymorphicFamily`] impl, `Serialize` and
/// `Deserialize` impls that go through [`crate::envelope`], a `JsonSchema`
/// impl, and `From<Shape>` for each shape.
///
/// [`PolymorphicFamily`]: crate::envelope::PolymorphicFamily
#[macro_export]
macro_rules! polymorphic_family {
    (
        $(#[$attr:meta])*
        $vis:vis enum $family:ident {
            discriminator = $field:literal,
            base = $base:ty,
            variants = {
                $(
                    $(#[$variant_attr:meta])*
                    $literal:literal => $variant:ident($shape:ty)
                ),+ $(,)?
            } $(,)?
        }
    ) => {
        $(#[$attr])*
        $vis enum $family {
            $(
                $(#[$variant_attr])*
                $variant($shape),
            )+
            /// A variant this client does not recognize.  Only the common
            /// fields are available.
            Unknown($crate::envelope::Unknown<$base>),
        }

        impl $crate::envelope::PolymorphicFamily for $family {
            const NAME: &'static str = stringify!($family);
            const DISCRIMINATOR: &'static str = $field;
            type Base = $base;
            const REGISTRY: &'static [$crate::envelope::VariantEntry<Self>] = &[
                $(
                    $crate::envelope::VariantEntry {
                        discriminator: $literal,
                        decode: |raw| {
                            $crate::__private::serde_json::from_slice::<$shape>(
                                raw,
                            )
                            .map($family::$variant)
                        },
                    },
                )+
            ];

            fn fallback(unknown: $crate::envelope::Unknown<$base>) -> Self {
                $family::Unknown(unknown)
            }

            fn discriminator(&self) -> ::std::option::Option<&str> {
                match self {
                    $(
                        $family::$variant(_) => {
                            ::std::option::Option::Some($literal)
                        }
                    )+
                    $family::Unknown(unknown) => {
                        unknown.discriminator.as_deref()
                    }
                }
            }

            fn base(&self) -> &$base {
                match self {
                    $( $family::$variant(shape) => &shape.base, )+
                    $family::Unknown(unknown) => &unknown.base,
                }
            }

            fn is_known(&self) -> bool {
                !matches!(self, $family::Unknown(_))
            }
        }

        impl $crate::__private::serde::Serialize for $family {
            fn serialize<S>(
                &self,
                serializer: S,
            ) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                match self {
                    $(
                        $family::$variant(shape) => {
                            $crate::envelope::serialize_tagged(
                                serializer,
                                $field,
                                ::std::option::Option::Some($literal),
                                shape,
                            )
                        }
                    )+
                    $family::Unknown(unknown) => {
                        $crate::envelope::serialize_tagged(
                            serializer,
                            $field,
                            unknown.discriminator.as_deref(),
                            &unknown.base,
                        )
                    }
                }
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $family {
            fn deserialize<D>(
                deserializer: D,
            ) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                $crate::envelope::deserialize_family(deserializer)
            }
        }

        impl $crate::__private::schemars::JsonSchema for $family {
            fn schema_name() -> ::std::string::String {
                ::std::string::String::from(stringify!($family))
            }

            fn json_schema(
                generator: &mut $crate::__private::SchemaGenerator,
            ) -> $crate::__private::schemars::schema::Schema {
                $crate::family::one_of_tagged(::std::vec![
                    $(
                        $crate::family::tagged_variant_schema(
                            $field,
                            $literal,
                            generator.subschema_for::<$shape>(),
                        ),
                    )+
                ])
            }
        }

        $(
            impl ::std::convert::From<$shape> for $family {
                fn from(shape: $shape) -> Self {
                    $family::$variant(shape)
                }
            }
        )+
    };
}

/// Describes one variant of a family: the shape's own schema, plus a
/// required discriminator property fixed to `literal`.
pub fn tagged_variant_schema(
    field: &'static str,
    literal: &'static str,
    shape: Schema,
) -> Schema {
    let mut tag_schema = SchemaObject {
        instance_type: Some(InstanceType::Object.into()),
        ..Default::default()
    };
    let obj = tag_schema.object();
    obj.required.insert(field.to_owned());
    obj.properties.insert(
        field.to_owned(),
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            enum_values: Some(vec![literal.into()]),
            ..Default::default()
        }
        .into(),
    );

    let mut schema = SchemaObject::default();
    schema.subschemas().all_of = Some(vec![shape, tag_schema.into()]);
    schema.into()
}

/// Combines the per-variant schemas of a family.
pub fn one_of_tagged(variants: Vec<Schema>) -> Schema {
    let mut schema = SchemaObject::default();
    schema.subschemas().one_of = Some(variants);
    schema.into()
}

/// Generates a schema generator with the settings the API documents use.
pub fn schema_generator() -> SchemaGenerator {
    schemars::r#gen::SchemaSettings::openapi3().into_generator()
}

#[cfg(test)]
mod test {
    use crate::block_storage::VolumeSourceDetails;
    use crate::family::schema_generator;

    #[test]
    fn test_family_schema_lists_variants() {
        let mut generator = schema_generator();
        let schema =
            generator.subschema_for::<VolumeSourceDetails>().into_object();
        let schema = match schema.reference {
            Some(_) => generator
                .definitions()
                .get("VolumeSourceDetails")
                .cloned()
                .expect("schema for VolumeSourceDetails")
                .into_object(),
            None => schema,
        };

        let one_of = schema
            .subschemas
            .and_then(|subschemas| subschemas.one_of)
            .expect("family schema should be a oneOf");
        assert_eq!(one_of.len(), 3);

        let literals: Vec<String> = one_of
            .into_iter()
            .map(|variant| {
                let all_of = variant
                    .into_object()
                    .subschemas
                    .and_then(|subschemas| subschemas.all_of)
                    .expect("variant schema should be an allOf");
                let mut tag = all_of[1].clone().into_object();
                let property = tag.object().properties.remove("type").unwrap();
                property.into_object().enum_values.unwrap()[0]
                    .as_str()
                    .unwrap()
                    .to_owned()
            })
            .collect();
        assert_eq!(literals, ["volume", "volumeBackup", "blockVolumeReplica"]);
    }
}
