// Compiles the pattern once per call site
macro_rules! regex(
    ($s:expr) => ({
        static RE: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
        RE.get_or_init(|| ::regex::Regex::new($s).expect("built-in pattern is valid"))
    });
);

/// Implements `serde::Serialize` and `serde::Deserialize` for an enum through
/// its `Display` and `FromStr` impls, so config files and record documents
/// use the same spelling as `to_string()`.
macro_rules! string_serde {
    ($e:ty) => {
        impl ::serde::Serialize for $e {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $e {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let s = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                ::std::str::FromStr::from_str(&s).map_err(::serde::de::Error::custom)
            }
        }
    };
}
