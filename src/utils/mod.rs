pub fn join<'a, T, S>(i: T, sep: S) -> String
where
    T: IntoIterator,
    T::Item: ToString,
    S: Into<&'a str>,
{
    i.into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(sep.into())
}

pub fn map_join<'a, T, S, F>(i: T, sep: S, f: F) -> String
where
    T: IntoIterator,
    S: Into<&'a str>,
    F: Fn(T::Item) -> String,
{
    i.into_iter().map(f).collect::<Vec<_>>().join(sep.into())
}

/// Returns the last segment of a dotted name, e.g. `collections.abc.Mapping` -> `Mapping`.
pub fn short_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Returns the top-level package of a dotted name, e.g. `collections.abc.Mapping` ->
/// `collections`. Undotted names have no package.
pub fn root_package(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((module, _)) => module.split('.').next().unwrap_or(module),
        None => "",
    }
}
