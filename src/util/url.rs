use url::Url;

/// Make `url` usable as a join base: `Url::join` drops the last path segment
/// unless the path ends with `/`.
pub fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
