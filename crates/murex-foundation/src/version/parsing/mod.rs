// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use nom::branch::alt;
use nom::character::complete::{char, digit1, satisfy};
use nom::combinator::{all_consuming, consumed, map, map_res, opt};
use nom::error::{ContextError, FromExternalError, ParseError};
use nom::multi::{many0, separated_list1};
use nom::sequence::{pair, preceded, tuple};
use nom::IResult;
use nom_supreme::tag::complete::tag;
use nom_supreme::tag::TagError;

use super::{NumberPart, Suffix, SuffixKind, VersionSpec};

/// Parse one dot-separated numeric component.
pub(crate) fn number_part<'a, E>(input: &'a str) -> IResult<&'a str, NumberPart, E>
where
    E: ParseError<&'a str>,
{
    map(digit1, |digits: &str| NumberPart(digits.to_owned()))(input)
}

/// Parse a version suffix class name.
///
/// `pre` must be tried before `p` so that `_pre1` is not read as
/// `_p` followed by trailing garbage.
pub(crate) fn suffix_kind<'a, E>(input: &'a str) -> IResult<&'a str, SuffixKind, E>
where
    E: ParseError<&'a str> + TagError<&'a str, &'static str>,
{
    alt((
        map(tag("alpha"), |_| SuffixKind::Alpha),
        map(tag("beta"), |_| SuffixKind::Beta),
        map(tag("pre"), |_| SuffixKind::Pre),
        map(tag("rc"), |_| SuffixKind::Rc),
        map(tag("p"), |_| SuffixKind::P),
    ))(input)
}

/// Parse one `_kindN` suffix.
pub(crate) fn suffix<'a, E>(input: &'a str) -> IResult<&'a str, Suffix, E>
where
    E: ParseError<&'a str>
        + TagError<&'a str, &'static str>
        + FromExternalError<&'a str, std::num::ParseIntError>,
{
    map(
        preceded(
            char('_'),
            pair(suffix_kind, opt(map_res(digit1, |n: &str| n.parse::<u64>()))),
        ),
        |(kind, number)| Suffix { kind, number },
    )(input)
}

fn revision<'a, E>(input: &'a str) -> IResult<&'a str, u64, E>
where
    E: ParseError<&'a str>
        + TagError<&'a str, &'static str>
        + FromExternalError<&'a str, std::num::ParseIntError>,
{
    preceded(tag("-r"), map_res(digit1, |n: &str| n.parse::<u64>()))(input)
}

/// Parse the optional single trailing letter of a version, as in `1.0b`.
pub(crate) fn version_letter<'a, E>(input: &'a str) -> IResult<&'a str, char, E>
where
    E: ParseError<&'a str>,
{
    satisfy(|c| c.is_ascii_lowercase())(input)
}

/// Parse a complete version, filling in the consumed text so that
/// display round-trips.
///
/// This parser stops at the first character that cannot extend the
/// version, which lets it be embedded in larger grammars.
pub fn version<'a, E>(input: &'a str) -> IResult<&'a str, VersionSpec, E>
where
    E: ParseError<&'a str>
        + ContextError<&'a str>
        + TagError<&'a str, &'static str>
        + FromExternalError<&'a str, std::num::ParseIntError>,
{
    map(
        consumed(alt((
            map(preceded(tag("scm"), opt(revision)), |rev| {
                VersionSpec::new(String::new(), Vec::new(), None, Vec::new(), true, rev)
            }),
            map(
                tuple((
                    separated_list1(char('.'), number_part),
                    opt(version_letter),
                    many0(suffix),
                    opt(tag("-scm")),
                    opt(revision),
                )),
                |(numbers, letter, suffixes, scm, rev)| {
                    VersionSpec::new(String::new(), numbers, letter, suffixes, scm.is_some(), rev)
                },
            ),
        ))),
        |(text, mut spec): (&str, VersionSpec)| {
            spec.text = text.to_owned();
            spec
        },
    )(input)
}

/// Parse a complete version string, requiring all input to be consumed.
pub(crate) fn version_spec(input: &str) -> Result<VersionSpec, String> {
    let parsed: IResult<_, _, nom_supreme::error::ErrorTree<&str>> =
        all_consuming(version)(input);
    match parsed {
        Ok((_, spec)) => Ok(spec),
        Err(err) => Err(err.to_string()),
    }
}
