#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a keyword table (`BTreeMap<String, Vec<String>>`) from literals.
#[macro_export]
macro_rules! table {
    ( $( $key:literal => [ $($val:literal),* $(,)? ] ),* $(,)? ) => {{
        let mut map: std::collections::BTreeMap<String, Vec<String>> = std::collections::BTreeMap::new();
        $( map.insert($key.to_string(), vec![ $($val.to_string()),* ]); )*
        map
    }};
}

#[macro_export]
macro_rules! synonym {
    (
        $canonical:literal => [ $($alias:literal),* $(,)? ]
        $(, two_way: $two_way:expr)?
        $(,)?
    ) => {
        $crate::SynonymRule {
            canonical: $canonical.to_string(),
            aliases: vec![ $($alias.to_string()),* ],
            two_way: { false $(|| $two_way)? },
        }
    };
}

#[macro_export]
macro_rules! exclusion {
    (
        name: $name:literal,
        shared: [ $($shared:literal),* $(,)? ],
        left: { categories: [ $($lc:literal),* $(,)? ], markers: [ $($lm:literal),* $(,)? ] $(,)? },
        right: { categories: [ $($rc:literal),* $(,)? ], markers: [ $($rm:literal),* $(,)? ] $(,)? }
        $(,)?
    ) => {
        $crate::ExclusionRule {
            name: $name.to_string(),
            shared: vec![ $($shared.to_string()),* ],
            left: $crate::ExclusionSide {
                categories: vec![ $($lc.to_string()),* ],
                markers: vec![ $($lm.to_string()),* ],
            },
            right: $crate::ExclusionSide {
                categories: vec![ $($rc.to_string()),* ],
                markers: vec![ $($rm.to_string()),* ],
            },
        }
    };
}
