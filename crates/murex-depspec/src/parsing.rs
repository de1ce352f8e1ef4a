// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! The text form of [`PackageDepSpec`].
//!
//! The grammar is scanned left to right: an optional version
//! operator, the name (with a version attached when an operator is
//! present), an optional `:slot`, an optional `::repository`
//! qualifier, then any number of bracketed requirement groups.

use std::path::PathBuf;

use murex_foundation::name::{
    CategoryName,
    ChoiceNameWithPrefixBuf,
    PackageNamePart,
    QualifiedPackageName,
    SlotNameBuf,
};
use murex_foundation::version::{parse_version, VersionOperator};

use crate::error::{PackageDepSpecError, Result};
use crate::options::ParseOptions;
use crate::package_dep_spec::{
    ChoiceRequirement,
    ChoiceRequirementKind,
    InstallableToPath,
    InstallableToRepository,
    KeyRequirement,
    NameConstraint,
    PackageDepSpec,
    PackageDepSpecBuilder,
    SlotRequirement,
    VersionRequirementsMode,
};

fn err(text: &str, message: impl Into<String>) -> crate::error::Error {
    PackageDepSpecError::new_error(text, message)
}

/// Parse the user-facing text form of a package dep spec.
pub fn parse_package_dep_spec(text: &str, options: &ParseOptions) -> Result<PackageDepSpec> {
    let mut rest = text;
    let mut builder = PackageDepSpec::builder();

    let op = take_operator(&mut rest);
    if op == Some(VersionOperator::EqualIgnoringRevision) && !options.allow_tilde {
        return Err(err(text, "'~' requirements are not allowed here"));
    }

    let main_len = rest
        .find(|c: char| c == ':' || c == '[')
        .unwrap_or(rest.len());
    let (main, tail) = rest.split_at(main_len);
    rest = tail;
    if main.is_empty() {
        return Err(err(text, "expected a package name"));
    }

    builder = match op {
        Some(op) => {
            let (name, mut version_text) = split_name_and_version(text, main)?;
            let mut op = op;
            if let Some(stripped) = version_text.strip_suffix('*') {
                if op != VersionOperator::Equal {
                    return Err(err(text, "'*' is only valid after an '=' requirement"));
                }
                op = VersionOperator::EqualStarPrefix;
                version_text = stripped;
            }
            let version = parse_version(version_text)?;
            builder
                .name_constraint(parse_name_constraint(text, name, options)?)
                .version_requirement(op, version)
        }
        None => builder.name_constraint(parse_name_constraint(text, main, options)?),
    };

    // a slot requirement is a single ':', a repository qualifier '::'
    if rest.starts_with(':') && !rest.starts_with("::") {
        if !options.allow_slot_deps {
            return Err(err(text, "slot dependencies are not allowed here"));
        }
        let slot_len = rest[1..]
            .find(|c: char| c == ':' || c == '[')
            .map(|i| i + 1)
            .unwrap_or(rest.len());
        let (slot_text, tail) = rest.split_at(slot_len);
        rest = tail;
        builder = builder.slot_requirement(parse_slot_requirement(text, &slot_text[1..], options)?);
    }

    if let Some(tail) = rest.strip_prefix("::") {
        if !options.allow_repository_deps {
            return Err(err(text, "repository dependencies are not allowed here"));
        }
        let repo_len = tail.find('[').unwrap_or(tail.len());
        let (repo_text, tail) = tail.split_at(repo_len);
        rest = tail;
        builder = parse_repository_qualifier(text, repo_text, builder)?;
    }

    while let Some(tail) = rest.strip_prefix('[') {
        let close = tail
            .find(']')
            .ok_or_else(|| err(text, "unterminated '['"))?;
        let body = &tail[..close];
        rest = &tail[close + 1..];
        builder = parse_bracket_group(text, body, options, builder)?;
    }

    if !rest.is_empty() {
        return Err(err(text, format!("unexpected trailing text '{rest}'")));
    }

    builder.build()
}

fn take_operator(rest: &mut &str) -> Option<VersionOperator> {
    // two-character spellings first; '=*' is written as a trailing
    // star and never appears in prefix position
    for (prefix, op) in [
        ("<=", VersionOperator::LessOrEqual),
        (">=", VersionOperator::GreaterOrEqual),
        ("<", VersionOperator::Less),
        (">", VersionOperator::Greater),
        ("~", VersionOperator::EqualIgnoringRevision),
        ("=", VersionOperator::Equal),
    ] {
        if let Some(tail) = rest.strip_prefix(prefix) {
            *rest = tail;
            return Some(op);
        }
    }
    None
}

/// Split `cat/pkg-1.0-r1` into the name and the version text, taking
/// the longest hyphen-separated suffix that reads as a version.
fn split_name_and_version<'t>(text: &str, main: &'t str) -> Result<(&'t str, &'t str)> {
    for (index, _) in main.char_indices().filter(|(_, c)| *c == '-') {
        let candidate = &main[index + 1..];
        let version_part = candidate.strip_suffix('*').unwrap_or(candidate);
        if parse_version(version_part).is_ok() {
            return Ok((&main[..index], candidate));
        }
    }
    Err(err(
        text,
        "an operator requires a version at the end of the name",
    ))
}

fn parse_name_constraint(
    text: &str,
    name: &str,
    options: &ParseOptions,
) -> Result<NameConstraint> {
    let (cat, pkg) = name
        .split_once('/')
        .ok_or_else(|| err(text, format!("'{name}' is not of the form 'category/package'")))?;
    let constraint = match (cat, pkg) {
        ("*", "*") => NameConstraint::Any,
        ("*", p) => NameConstraint::NamedPackage(PackageNamePart::new(p)?.to_owned()),
        (c, "*") => NameConstraint::InCategory(CategoryName::new(c)?.to_owned()),
        (c, p) => {
            return Ok(NameConstraint::Qualified(QualifiedPackageName::new(
                CategoryName::new(c)?.to_owned(),
                PackageNamePart::new(p)?.to_owned(),
            )))
        }
    };
    if !options.allow_wildcards {
        return Err(err(text, "wildcards are not allowed here"));
    }
    Ok(constraint)
}

fn parse_slot_requirement(
    text: &str,
    slot: &str,
    options: &ParseOptions,
) -> Result<SlotRequirement> {
    match slot {
        "" => Err(err(text, "expected a slot after ':'")),
        "=" => {
            if !options.allow_slot_equal_deps {
                return Err(err(text, "':=' dependencies are not allowed here"));
            }
            Ok(SlotRequirement::AnyLocked)
        }
        "*" => {
            if !options.allow_slot_star_deps {
                return Err(err(text, "':*' dependencies are not allowed here"));
            }
            Ok(SlotRequirement::AnyUnlocked)
        }
        _ => {
            let (body, locked) = match slot.strip_suffix('=') {
                Some(body) => (body, true),
                None => (slot, false),
            };
            if locked && !options.allow_slot_equal_deps {
                return Err(err(text, "':slot=' dependencies are not allowed here"));
            }
            let (name, sub) = match body.split_once('/') {
                Some((name, sub)) => (name, Some(sub)),
                None => (body, None),
            };
            Ok(SlotRequirement::Exact {
                name: name.parse::<SlotNameBuf>()?,
                sub_slot: sub.map(str::parse).transpose()?,
                locked,
            })
        }
    }
}

fn parse_repository_qualifier(
    text: &str,
    repo: &str,
    mut builder: PackageDepSpecBuilder,
) -> Result<PackageDepSpecBuilder> {
    if repo.is_empty() {
        return Err(err(text, "expected a repository after '::'"));
    }

    if repo.starts_with('/') {
        return Ok(match repo.strip_suffix("??") {
            Some(path) => builder.installable_to_path(InstallableToPath {
                path: PathBuf::from(path),
                include_masked: true,
            }),
            None => match repo.strip_suffix('?') {
                Some(path) => builder.installable_to_path(InstallableToPath {
                    path: PathBuf::from(path),
                    include_masked: false,
                }),
                None => builder.installed_at_path(PathBuf::from(repo)),
            },
        });
    }

    if let Some((from, to)) = repo.split_once("->") {
        if to.is_empty() {
            return Err(err(text, "expected a destination repository after '->'"));
        }
        if !from.is_empty() {
            builder = builder.from_repository(from.parse()?);
        }
        return Ok(builder.installable_to_repository(InstallableToRepository {
            repository: to.parse()?,
            include_masked: false,
        }));
    }

    if let Some(name) = repo.strip_suffix("??") {
        return Ok(builder.installable_to_repository(InstallableToRepository {
            repository: name.parse()?,
            include_masked: true,
        }));
    }
    if let Some(name) = repo.strip_suffix('?') {
        return Ok(builder.installable_to_repository(InstallableToRepository {
            repository: name.parse()?,
            include_masked: false,
        }));
    }
    Ok(builder.in_repository(repo.parse()?))
}

fn parse_bracket_group(
    text: &str,
    body: &str,
    options: &ParseOptions,
    mut builder: PackageDepSpecBuilder,
) -> Result<PackageDepSpecBuilder> {
    if body.is_empty() {
        return Err(err(text, "empty '[]' requirement group"));
    }

    if let Some(key_body) = body.strip_prefix('.') {
        if !options.allow_key_requirements {
            return Err(err(text, "key requirements are not allowed here"));
        }
        let (key, value) = key_body
            .split_once('=')
            .ok_or_else(|| err(text, format!("'[.{key_body}]' has no '='")))?;
        if key.is_empty() {
            return Err(err(text, "key requirement with an empty key"));
        }
        return Ok(builder.key_requirement(KeyRequirement {
            key: key.to_owned(),
            value: value.to_owned(),
        }));
    }

    if body.starts_with(['<', '>', '=', '~']) {
        if !options.allow_ranged_deps {
            return Err(err(text, "ranged dependencies are not allowed here"));
        }
        let (sep, mode) = if body.contains('|') {
            ('|', VersionRequirementsMode::Or)
        } else {
            ('&', VersionRequirementsMode::And)
        };
        builder = builder.version_requirements_mode(mode);
        for part in body.split(sep) {
            let mut part_rest = part;
            let Some(mut op) = take_operator(&mut part_rest) else {
                return Err(err(text, format!("'{part}' has no version operator")));
            };
            let version_text = match part_rest.strip_suffix('*') {
                Some(stripped) if op == VersionOperator::Equal => {
                    op = VersionOperator::EqualStarPrefix;
                    stripped
                }
                Some(_) => {
                    return Err(err(text, "'*' is only valid after an '=' requirement"));
                }
                None => part_rest,
            };
            builder = builder.version_requirement(op, parse_version(version_text)?);
        }
        return Ok(builder);
    }

    if !options.allow_use_deps {
        return Err(err(text, "use dependencies are not allowed here"));
    }
    for part in body.split(',') {
        builder = builder.choice_requirement(parse_choice_requirement(text, part, options)?);
    }
    Ok(builder)
}

fn parse_choice_requirement(
    text: &str,
    part: &str,
    options: &ParseOptions,
) -> Result<ChoiceRequirement> {
    let (negated, rest) = match part.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, part),
    };
    let (disabled, rest) = match rest.strip_prefix('-') {
        Some(rest) if !negated => (true, rest),
        _ => (false, rest),
    };

    let (rest, marker) = if let Some(stripped) = rest.strip_suffix('?') {
        (stripped, Some('?'))
    } else if let Some(stripped) = rest.strip_suffix('=') {
        (stripped, Some('='))
    } else {
        (rest, None)
    };

    let (name_text, default_value) = if let Some(stripped) = rest.strip_suffix("(+)") {
        (stripped, Some(true))
    } else if let Some(stripped) = rest.strip_suffix("(-)") {
        (stripped, Some(false))
    } else {
        (rest, None)
    };
    if default_value.is_some() && !options.allow_use_dep_defaults {
        return Err(err(text, "use dependency defaults are not allowed here"));
    }

    let kind = match (negated, disabled, marker) {
        (false, false, None) => ChoiceRequirementKind::Enabled,
        (false, true, None) => ChoiceRequirementKind::Disabled,
        (false, false, Some('=')) => ChoiceRequirementKind::EqualTo,
        (false, false, Some('?')) => ChoiceRequirementKind::IfEnabled,
        (true, false, Some('?')) => ChoiceRequirementKind::IfDisabled,
        _ => {
            return Err(err(
                text,
                format!("'[{part}]' is not a valid use requirement"),
            ))
        }
    };

    Ok(ChoiceRequirement {
        name: name_text.parse::<ChoiceNameWithPrefixBuf>()?,
        kind,
        default_value,
    })
}
