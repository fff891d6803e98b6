use core::fmt;
use core::marker::PhantomData;
use core::str::FromStr;
use serde::{Deserialize, Deserializer, de};
use serde::{Serialize, Serializer, ser};

use crate::{SecurityDescriptor, Sid};

impl Serialize for Sid {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            let bytes = self.to_bytes().map_err(ser::Error::custom)?;
            serializer.serialize_bytes(&bytes)
        }
    }
}

impl<'de> Deserialize<'de> for Sid {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_text_or_binary(
            deserializer,
            "a Windows SID as a string (e.g., \"S-1-...\" or \"SY\") or as raw binary",
        )
    }
}

impl Serialize for SecurityDescriptor {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            let text = self.to_sddl().map_err(ser::Error::custom)?;
            serializer.serialize_str(&text)
        } else {
            let bytes = self.to_bytes().map_err(ser::Error::custom)?;
            serializer.serialize_bytes(&bytes)
        }
    }
}

impl<'de> Deserialize<'de> for SecurityDescriptor {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_text_or_binary(
            deserializer,
            "an SDDL string or a self-relative security descriptor",
        )
    }
}

// Generic helper for types that support FromStr and TryFrom<&[u8]>
fn deserialize_text_or_binary<'de, D, T>(
    deserializer: D,
    expecting: &'static str,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    for<'a> T: FromStr + TryFrom<&'a [u8]>,
    <T as FromStr>::Err: fmt::Display,
    for<'a> <T as TryFrom<&'a [u8]>>::Error: fmt::Display,
{
    struct Visitor<T> {
        expecting: &'static str,
        _marker: PhantomData<T>,
    }

    impl<'de, T> de::Visitor<'de> for Visitor<T>
    where
        for<'a> T: FromStr + TryFrom<&'a [u8]>,
        <T as FromStr>::Err: fmt::Display,
        for<'a> <T as TryFrom<&'a [u8]>>::Error: fmt::Display,
    {
        type Value = T;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.expecting)
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            T::from_str(v).map_err(|err| E::custom(format_args!("invalid value {v:?}: {err}")))
        }

        fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            T::try_from(v).map_err(E::custom)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or_default());
            while let Some(byte) = seq.next_element::<u8>()? {
                bytes.push(byte);
            }
            T::try_from(bytes.as_slice()).map_err(de::Error::custom)
        }
    }

    let visitor = Visitor::<T> {
        expecting,
        _marker: PhantomData,
    };
    if deserializer.is_human_readable() {
        deserializer.deserialize_str(visitor)
    } else {
        deserializer.deserialize_bytes(visitor)
    }
}
