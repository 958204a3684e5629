/// Returns the first candidate that is present and not blank.
///
/// Candidates are examined in order, so the iterator order *is* the
/// preference order. Absent values (`None`) and whitespace-only strings are
/// skipped. Values are returned untrimmed.
///
/// # Examples
///
/// ```
/// use oreilly_feed::util::first_non_empty;
///
/// let cover = None;
/// let thumbnail = Some("https://img/thumb.jpg");
/// let image = Some("https://img/full.jpg");
/// assert_eq!(
///     first_non_empty([cover, thumbnail, image]),
///     Some("https://img/thumb.jpg")
/// );
/// assert_eq!(first_non_empty([None, Some("  ")]), None);
/// ```
pub fn first_non_empty<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}
