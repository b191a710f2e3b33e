macro_rules! impl_perf_value_from {
    ($variant:ident as $target:ty: $($t:ty), *) => {
        $(
            impl From<$t> for PerfValue {
                fn from(value: $t) -> Self {
                    PerfValue::$variant(value as $target)
                }
            }
        )*
    };
}

/// Lets you simply create a perfdata list from multiple points. It's a bit like the vec! macro.
/// ```rust
/// # #[macro_use]
/// # extern crate checkplugin;
/// #
/// # use checkplugin::Perfdata;
/// #
/// # fn main() {
/// let list = perfdata![Perfdata::new("test1", 23), Perfdata::new("test2", 42)];
/// assert_eq!(&list.to_string(), "test1=23 test2=42");
/// # }
/// ```
#[macro_export]
macro_rules! perfdata {
    ($( $p:expr ), * $(,)?) => {
        {
            let mut list = $crate::PerfdataList::new();
            $(
                list.push($p);
            )*
            list
        }
    };
}

/// Appends `;`-separated fields to a token head, dropping empty trailing fields.
macro_rules! perf_fields {
    ($head:expr, $( $field:expr ), *) => {
        {
            let mut s = String::from($head);
            $(
                s.push(';');
                s.push_str(&$field.to_perf_string());
            )*
            s.trim_end_matches(';').to_string()
        }
    };
}
