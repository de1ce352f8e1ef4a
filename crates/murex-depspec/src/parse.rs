// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! The whitespace-tokenised spec tree parser.
//!
//! One parse loop serves every tree kind; a [`TreeGrammar`]
//! implementation per kind decides which tokens are legal and how
//! leaves are built. Group types are decided by the token before a
//! `(`: nothing for `All`, `||` for `Any`, `flag?` or `!flag?` for a
//! conditional group.

use crate::error::{Result, SpecTreeParseError};
use crate::options::ParseOptions;
use crate::package_dep_spec::{DepSpecAnnotations, PackageDepSpec};
use crate::spec_tree::{
    BlockDepSpec,
    ConditionalDepSpec,
    DependencyLabelsDepSpec,
    DependencySpec,
    FetchableUriDepSpec,
    FetchableUriSpec,
    LicenseDepSpec,
    LicenseSpec,
    NamedSetDepSpec,
    PlainTextDepSpec,
    PlainTextSpec,
    ProvideSpec,
    SetSpec,
    SimpleUriDepSpec,
    SimpleUriSpec,
    UriLabelsDepSpec,
};

/// How one tree kind builds its nodes and which tokens it accepts.
trait TreeGrammar: Sized {
    type Node;

    const ALLOWS_ANY: bool;
    const ALLOWS_CONDITIONALS: bool;
    const ALLOWS_LABELS: bool;
    const ALLOWS_ARROWS: bool;

    fn all(children: Vec<Self::Node>) -> Self::Node;

    fn any(children: Vec<Self::Node>) -> Self::Node;

    fn conditional(condition: ConditionalDepSpec, children: Vec<Self::Node>) -> Self::Node;

    fn leaf(
        token: &str,
        rename: Option<&str>,
        position: usize,
        options: &ParseOptions,
    ) -> Result<Self::Node>;

    fn label(token: &str, position: usize) -> Result<Self::Node>;

    /// Attach an annotation block to the most recent node, or reject
    /// it for node types that cannot carry one.
    fn annotate(
        node: &mut Self::Node,
        annotations: DepSpecAnnotations,
        position: usize,
    ) -> Result<()>;
}

enum GroupKind {
    All,
    Any,
    Conditional(ConditionalDepSpec),
}

struct Frame<N> {
    kind: GroupKind,
    children: Vec<N>,
}

fn parse_tree<G: TreeGrammar>(input: &str, options: &ParseOptions) -> Result<G::Node> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let mut stack: Vec<Frame<G::Node>> = vec![Frame {
        kind: GroupKind::All,
        children: Vec::new(),
    }];
    let mut pending: Option<GroupKind> = None;
    let mut index = 0;

    while index < tokens.len() {
        let token = tokens[index];
        let position = index;
        index += 1;

        if let Some(pending_kind) = pending.take() {
            if token != "(" {
                return Err(SpecTreeParseError::new_error(
                    token,
                    position,
                    "expected '(' after a group marker",
                ));
            }
            stack.push(Frame {
                kind: pending_kind,
                children: Vec::new(),
            });
            continue;
        }

        match token {
            "(" => {
                stack.push(Frame {
                    kind: GroupKind::All,
                    children: Vec::new(),
                });
            }
            ")" => {
                if stack.len() < 2 {
                    return Err(SpecTreeParseError::new_error(
                        token,
                        position,
                        "')' without a matching '('",
                    ));
                }
                let frame = stack.pop().expect("length checked above");
                let node = match frame.kind {
                    GroupKind::All => G::all(frame.children),
                    GroupKind::Any => G::any(frame.children),
                    GroupKind::Conditional(cond) => G::conditional(cond, frame.children),
                };
                stack
                    .last_mut()
                    .expect("root frame always present")
                    .children
                    .push(node);
            }
            "||" => {
                if !G::ALLOWS_ANY || !options.allow_any_groups {
                    return Err(SpecTreeParseError::new_error(
                        token,
                        position,
                        "'||' groups are not allowed here",
                    ));
                }
                pending = Some(GroupKind::Any);
            }
            "[[" => {
                if !options.allow_annotations {
                    return Err(SpecTreeParseError::new_error(
                        token,
                        position,
                        "annotations are not allowed here",
                    ));
                }
                let (annotations, next) = parse_annotations(&tokens, index)?;
                index = next;
                match stack.last_mut().and_then(|f| f.children.last_mut()) {
                    Some(node) => G::annotate(node, annotations, position)?,
                    None => {
                        return Err(SpecTreeParseError::new_error(
                            token,
                            position,
                            "annotation with no preceding node",
                        ))
                    }
                }
            }
            "->" => {
                return Err(SpecTreeParseError::new_error(
                    token,
                    position,
                    "'->' must follow a fetchable URI",
                ));
            }
            // a conditional marker is a bare `flag?`; tokens like
            // `cat/pkg::repo?` are leaves
            _ if token.ends_with('?') && !token.contains(['/', ':', '[']) => {
                if !G::ALLOWS_CONDITIONALS {
                    return Err(SpecTreeParseError::new_error(
                        token,
                        position,
                        "conditional groups are not allowed here",
                    ));
                }
                pending = Some(GroupKind::Conditional(token.parse()?));
            }
            _ if token.ends_with(':') => {
                if !G::ALLOWS_LABELS || !options.allow_labels {
                    return Err(SpecTreeParseError::new_error(
                        token,
                        position,
                        "labels are not allowed here",
                    ));
                }
                let node = G::label(token, position)?;
                stack
                    .last_mut()
                    .expect("root frame always present")
                    .children
                    .push(node);
            }
            _ => {
                let rename = if tokens.get(index) == Some(&"->") {
                    if !G::ALLOWS_ARROWS || !options.allow_fetch_renames {
                        return Err(SpecTreeParseError::new_error(
                            "->",
                            index,
                            "'->' renames are not allowed here",
                        ));
                    }
                    let target = tokens.get(index + 1).copied().ok_or_else(|| {
                        SpecTreeParseError::new_error("->", index, "'->' with no rename target")
                    })?;
                    index += 2;
                    Some(target)
                } else {
                    None
                };
                let node = G::leaf(token, rename, position, options)?;
                stack
                    .last_mut()
                    .expect("root frame always present")
                    .children
                    .push(node);
            }
        }
    }

    if pending.is_some() {
        return Err(SpecTreeParseError::new_error(
            tokens.last().copied().unwrap_or(""),
            tokens.len(),
            "dangling group marker at end of input",
        ));
    }
    if stack.len() != 1 {
        return Err(SpecTreeParseError::new_error(
            tokens.last().copied().unwrap_or(""),
            tokens.len(),
            "unterminated '(' group",
        ));
    }
    let root = stack.pop().expect("length checked above");
    Ok(G::all(root.children))
}

fn parse_annotations(
    tokens: &[&str],
    mut index: usize,
) -> Result<(DepSpecAnnotations, usize)> {
    let mut annotations = DepSpecAnnotations::new();
    loop {
        let Some(&key) = tokens.get(index) else {
            return Err(SpecTreeParseError::new_error(
                "[[",
                index,
                "unterminated annotation block",
            ));
        };
        if key == "]]" {
            return Ok((annotations, index + 1));
        }
        match (tokens.get(index + 1), tokens.get(index + 2)) {
            (Some(&"="), Some(&value)) if value != "]]" => {
                annotations.insert(key.to_owned(), value.to_owned());
                index += 3;
            }
            _ => {
                return Err(SpecTreeParseError::new_error(
                    key,
                    index,
                    "annotation entries take the form 'key = value'",
                ));
            }
        }
    }
}

fn no_labels_here<N>(token: &str, position: usize) -> Result<N> {
    Err(SpecTreeParseError::new_error(
        token,
        position,
        "labels are not allowed in this tree",
    ))
}

fn annotate_unsupported(position: usize) -> crate::error::Error {
    SpecTreeParseError::new_error("[[", position, "this node cannot carry annotations")
}

struct DependencyGrammar;

impl TreeGrammar for DependencyGrammar {
    type Node = DependencySpec;

    const ALLOWS_ANY: bool = true;
    const ALLOWS_CONDITIONALS: bool = true;
    const ALLOWS_LABELS: bool = true;
    const ALLOWS_ARROWS: bool = false;

    fn all(children: Vec<Self::Node>) -> Self::Node {
        DependencySpec::All(children)
    }

    fn any(children: Vec<Self::Node>) -> Self::Node {
        DependencySpec::Any(children)
    }

    fn conditional(condition: ConditionalDepSpec, children: Vec<Self::Node>) -> Self::Node {
        DependencySpec::Conditional(condition, children)
    }

    fn leaf(
        token: &str,
        _rename: Option<&str>,
        _position: usize,
        options: &ParseOptions,
    ) -> Result<Self::Node> {
        if let Some(set) = token.strip_prefix('@') {
            return Ok(DependencySpec::NamedSet(NamedSetDepSpec {
                name: set.parse()?,
            }));
        }
        if let Some(body) = token.strip_prefix("!!") {
            return Ok(DependencySpec::Block(BlockDepSpec {
                spec: PackageDepSpec::parse(body, options)?,
                strong: true,
            }));
        }
        if let Some(body) = token.strip_prefix('!') {
            return Ok(DependencySpec::Block(BlockDepSpec {
                spec: PackageDepSpec::parse(body, options)?,
                strong: false,
            }));
        }
        Ok(DependencySpec::Package(PackageDepSpec::parse(
            token, options,
        )?))
    }

    fn label(token: &str, _position: usize) -> Result<Self::Node> {
        Ok(DependencySpec::Labels(
            token.parse::<DependencyLabelsDepSpec>()?,
        ))
    }

    fn annotate(
        node: &mut Self::Node,
        annotations: DepSpecAnnotations,
        position: usize,
    ) -> Result<()> {
        match node {
            DependencySpec::Package(spec) => {
                spec.set_annotations(annotations);
                Ok(())
            }
            DependencySpec::Block(block) => {
                block.spec.set_annotations(annotations);
                Ok(())
            }
            _ => Err(annotate_unsupported(position)),
        }
    }
}

struct LicenseGrammar;

impl TreeGrammar for LicenseGrammar {
    type Node = LicenseSpec;

    const ALLOWS_ANY: bool = true;
    const ALLOWS_CONDITIONALS: bool = true;
    const ALLOWS_LABELS: bool = false;
    const ALLOWS_ARROWS: bool = false;

    fn all(children: Vec<Self::Node>) -> Self::Node {
        LicenseSpec::All(children)
    }

    fn any(children: Vec<Self::Node>) -> Self::Node {
        LicenseSpec::Any(children)
    }

    fn conditional(condition: ConditionalDepSpec, children: Vec<Self::Node>) -> Self::Node {
        LicenseSpec::Conditional(condition, children)
    }

    fn leaf(
        token: &str,
        _rename: Option<&str>,
        _position: usize,
        _options: &ParseOptions,
    ) -> Result<Self::Node> {
        Ok(LicenseSpec::License(LicenseDepSpec {
            name: token.to_owned(),
            annotations: DepSpecAnnotations::new(),
        }))
    }

    fn label(token: &str, position: usize) -> Result<Self::Node> {
        no_labels_here(token, position)
    }

    fn annotate(
        node: &mut Self::Node,
        annotations: DepSpecAnnotations,
        position: usize,
    ) -> Result<()> {
        match node {
            LicenseSpec::License(license) => {
                license.annotations = annotations;
                Ok(())
            }
            _ => Err(annotate_unsupported(position)),
        }
    }
}

struct ProvideGrammar;

impl TreeGrammar for ProvideGrammar {
    type Node = ProvideSpec;

    const ALLOWS_ANY: bool = false;
    const ALLOWS_CONDITIONALS: bool = true;
    const ALLOWS_LABELS: bool = false;
    const ALLOWS_ARROWS: bool = false;

    fn all(children: Vec<Self::Node>) -> Self::Node {
        ProvideSpec::All(children)
    }

    fn any(_children: Vec<Self::Node>) -> Self::Node {
        unreachable!("ALLOWS_ANY is false")
    }

    fn conditional(condition: ConditionalDepSpec, children: Vec<Self::Node>) -> Self::Node {
        ProvideSpec::Conditional(condition, children)
    }

    fn leaf(
        token: &str,
        _rename: Option<&str>,
        _position: usize,
        options: &ParseOptions,
    ) -> Result<Self::Node> {
        Ok(ProvideSpec::Package(PackageDepSpec::parse(token, options)?))
    }

    fn label(token: &str, position: usize) -> Result<Self::Node> {
        no_labels_here(token, position)
    }

    fn annotate(
        node: &mut Self::Node,
        annotations: DepSpecAnnotations,
        position: usize,
    ) -> Result<()> {
        match node {
            ProvideSpec::Package(spec) => {
                spec.set_annotations(annotations);
                Ok(())
            }
            _ => Err(annotate_unsupported(position)),
        }
    }
}

struct PlainTextGrammar;

impl TreeGrammar for PlainTextGrammar {
    type Node = PlainTextSpec;

    const ALLOWS_ANY: bool = false;
    const ALLOWS_CONDITIONALS: bool = true;
    const ALLOWS_LABELS: bool = false;
    const ALLOWS_ARROWS: bool = false;

    fn all(children: Vec<Self::Node>) -> Self::Node {
        PlainTextSpec::All(children)
    }

    fn any(_children: Vec<Self::Node>) -> Self::Node {
        unreachable!("ALLOWS_ANY is false")
    }

    fn conditional(condition: ConditionalDepSpec, children: Vec<Self::Node>) -> Self::Node {
        PlainTextSpec::Conditional(condition, children)
    }

    fn leaf(
        token: &str,
        _rename: Option<&str>,
        _position: usize,
        _options: &ParseOptions,
    ) -> Result<Self::Node> {
        Ok(PlainTextSpec::PlainText(PlainTextDepSpec {
            text: token.to_owned(),
            annotations: DepSpecAnnotations::new(),
        }))
    }

    fn label(token: &str, position: usize) -> Result<Self::Node> {
        no_labels_here(token, position)
    }

    fn annotate(
        node: &mut Self::Node,
        annotations: DepSpecAnnotations,
        position: usize,
    ) -> Result<()> {
        match node {
            PlainTextSpec::PlainText(text) => {
                text.annotations = annotations;
                Ok(())
            }
            _ => Err(annotate_unsupported(position)),
        }
    }
}

struct SimpleUriGrammar;

impl TreeGrammar for SimpleUriGrammar {
    type Node = SimpleUriSpec;

    const ALLOWS_ANY: bool = false;
    const ALLOWS_CONDITIONALS: bool = true;
    const ALLOWS_LABELS: bool = false;
    const ALLOWS_ARROWS: bool = false;

    fn all(children: Vec<Self::Node>) -> Self::Node {
        SimpleUriSpec::All(children)
    }

    fn any(_children: Vec<Self::Node>) -> Self::Node {
        unreachable!("ALLOWS_ANY is false")
    }

    fn conditional(condition: ConditionalDepSpec, children: Vec<Self::Node>) -> Self::Node {
        SimpleUriSpec::Conditional(condition, children)
    }

    fn leaf(
        token: &str,
        _rename: Option<&str>,
        _position: usize,
        _options: &ParseOptions,
    ) -> Result<Self::Node> {
        Ok(SimpleUriSpec::Uri(SimpleUriDepSpec {
            uri: token.to_owned(),
            annotations: DepSpecAnnotations::new(),
        }))
    }

    fn label(token: &str, position: usize) -> Result<Self::Node> {
        no_labels_here(token, position)
    }

    fn annotate(
        node: &mut Self::Node,
        annotations: DepSpecAnnotations,
        position: usize,
    ) -> Result<()> {
        match node {
            SimpleUriSpec::Uri(uri) => {
                uri.annotations = annotations;
                Ok(())
            }
            _ => Err(annotate_unsupported(position)),
        }
    }
}

struct FetchableUriGrammar;

impl TreeGrammar for FetchableUriGrammar {
    type Node = FetchableUriSpec;

    const ALLOWS_ANY: bool = false;
    const ALLOWS_CONDITIONALS: bool = true;
    const ALLOWS_LABELS: bool = true;
    const ALLOWS_ARROWS: bool = true;

    fn all(children: Vec<Self::Node>) -> Self::Node {
        FetchableUriSpec::All(children)
    }

    fn any(_children: Vec<Self::Node>) -> Self::Node {
        unreachable!("ALLOWS_ANY is false")
    }

    fn conditional(condition: ConditionalDepSpec, children: Vec<Self::Node>) -> Self::Node {
        FetchableUriSpec::Conditional(condition, children)
    }

    fn leaf(
        token: &str,
        rename: Option<&str>,
        _position: usize,
        _options: &ParseOptions,
    ) -> Result<Self::Node> {
        Ok(FetchableUriSpec::Uri(FetchableUriDepSpec {
            uri: token.to_owned(),
            rename: rename.map(str::to_owned),
            annotations: DepSpecAnnotations::new(),
        }))
    }

    fn label(token: &str, _position: usize) -> Result<Self::Node> {
        let body = token.trim_end_matches(':');
        Ok(FetchableUriSpec::Labels(UriLabelsDepSpec {
            labels: body.split('+').map(str::to_owned).collect(),
        }))
    }

    fn annotate(
        node: &mut Self::Node,
        annotations: DepSpecAnnotations,
        position: usize,
    ) -> Result<()> {
        match node {
            FetchableUriSpec::Uri(uri) => {
                uri.annotations = annotations;
                Ok(())
            }
            _ => Err(annotate_unsupported(position)),
        }
    }
}

struct SetGrammar;

impl TreeGrammar for SetGrammar {
    type Node = SetSpec;

    const ALLOWS_ANY: bool = false;
    const ALLOWS_CONDITIONALS: bool = false;
    const ALLOWS_LABELS: bool = false;
    const ALLOWS_ARROWS: bool = false;

    fn all(children: Vec<Self::Node>) -> Self::Node {
        SetSpec::All(children)
    }

    fn any(_children: Vec<Self::Node>) -> Self::Node {
        unreachable!("ALLOWS_ANY is false")
    }

    fn conditional(_condition: ConditionalDepSpec, _children: Vec<Self::Node>) -> Self::Node {
        unreachable!("ALLOWS_CONDITIONALS is false")
    }

    fn leaf(
        token: &str,
        _rename: Option<&str>,
        _position: usize,
        options: &ParseOptions,
    ) -> Result<Self::Node> {
        if let Some(set) = token.strip_prefix('@') {
            return Ok(SetSpec::NamedSet(NamedSetDepSpec {
                name: set.parse()?,
            }));
        }
        Ok(SetSpec::Package(PackageDepSpec::parse(token, options)?))
    }

    fn label(token: &str, position: usize) -> Result<Self::Node> {
        no_labels_here(token, position)
    }

    fn annotate(
        node: &mut Self::Node,
        annotations: DepSpecAnnotations,
        position: usize,
    ) -> Result<()> {
        match node {
            SetSpec::Package(spec) => {
                spec.set_annotations(annotations);
                Ok(())
            }
            _ => Err(annotate_unsupported(position)),
        }
    }
}

/// Parse a dependency string into a [`DependencySpec`] tree.
pub fn parse_dependency_spec(input: &str, options: &ParseOptions) -> Result<DependencySpec> {
    parse_tree::<DependencyGrammar>(input, options)
}

/// Parse a license string into a [`LicenseSpec`] tree.
pub fn parse_license_spec(input: &str, options: &ParseOptions) -> Result<LicenseSpec> {
    parse_tree::<LicenseGrammar>(input, options)
}

/// Parse a provides string into a [`ProvideSpec`] tree.
pub fn parse_provide_spec(input: &str, options: &ParseOptions) -> Result<ProvideSpec> {
    parse_tree::<ProvideGrammar>(input, options)
}

/// Parse a restrict or description string into a [`PlainTextSpec`] tree.
pub fn parse_plain_text_spec(input: &str, options: &ParseOptions) -> Result<PlainTextSpec> {
    parse_tree::<PlainTextGrammar>(input, options)
}

/// Parse a homepage string into a [`SimpleUriSpec`] tree.
pub fn parse_simple_uri_spec(input: &str, options: &ParseOptions) -> Result<SimpleUriSpec> {
    parse_tree::<SimpleUriGrammar>(input, options)
}

/// Parse a source URI string into a [`FetchableUriSpec`] tree.
pub fn parse_fetchable_uri_spec(input: &str, options: &ParseOptions) -> Result<FetchableUriSpec> {
    parse_tree::<FetchableUriGrammar>(input, options)
}

/// Parse a set contents string into a [`SetSpec`] tree.
pub fn parse_set_spec(input: &str, options: &ParseOptions) -> Result<SetSpec> {
    parse_tree::<SetGrammar>(input, options)
}

#[cfg(test)]
#[path = "./parse_test.rs"]
mod parse_test;
