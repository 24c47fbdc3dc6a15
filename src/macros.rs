/// Builds a [`Value`](crate::Value) from JSON-like syntax.
///
/// Array elements and object values are token trees, so a negative number
/// nested inside a collection needs parentheses: `value!([1, (-2)])`.
///
/// ```rust
/// use dsio::{value, Value};
///
/// let row = value!({ "n": 1, "tags": ["a", "b"], "gone": null });
/// assert_eq!(row.to_string(), r#"{"n":1,"tags":["a","b"],"gone":null}"#);
/// assert_eq!(value!((-2)), Value::from(-2));
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::Map::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::Map::new();
        $(
            object.insert($key.to_string(), $crate::value!($value));
        )*
        $crate::Value::Object(object)
    }};

    ($s:expr) => {
        $crate::Value::from($s)
    };
}
