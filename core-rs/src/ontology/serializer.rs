/**
 * serializer.rs
 * Turtle writer for one named graph
 *
 * Output layout:
 * - `@prefix` directives from the graph's prefix map, plus `:` bound to the graph IRI
 * - the ontology subject first, then every named subject in IRI order
 * - blank nodes referenced exactly once are inlined as `[ ... ]`, or as `( ... )`
 *   when they form a well-formed rdf:first/rdf:rest list
 * - shared or cyclic blank nodes are written as `_:id` blocks at the end
 * - a trailing generator comment
 */

use once_cell::sync::Lazy;
use oxigraph::model::{Literal, NamedNode, NamedNodeRef, Subject, Term};
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::errors::Result;
use crate::ontology::prefixes::PrefixMap;
use crate::store::{QuadIndex, QuadPattern};
use crate::vocab::{rdf, xsd};

const PN_CHARS_BASE: &str = r"A-Za-z\x{00C0}-\x{00D6}\x{00D8}-\x{00F6}\x{00F8}-\x{02FF}\x{0370}-\x{037D}\x{037F}-\x{1FFF}\x{200C}-\x{200D}\x{2070}-\x{218F}\x{2C00}-\x{2FEF}\x{3001}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFFD}\x{10000}-\x{EFFFF}";
const PN_CHARS_EXTRA: &str = r"\-0-9\x{00B7}\x{0300}-\x{036F}\x{203F}-\x{2040}";

static PN_PREFIX: Lazy<Regex> = Lazy::new(|| {
    let chars = format!("[{}_{}]", PN_CHARS_BASE, PN_CHARS_EXTRA);
    Regex::new(&format!(r"^([{base}](({chars}|\.)*{chars})?)?$", base = PN_CHARS_BASE, chars = chars))
        .expect("PN_PREFIX pattern is valid")
});

static PN_LOCAL: Lazy<Regex> = Lazy::new(|| {
    let chars = format!("[{}_{}]", PN_CHARS_BASE, PN_CHARS_EXTRA);
    let percent = "%[0-9A-Fa-f]{2}";
    let first = format!("([{}_:0-9]|{})", PN_CHARS_BASE, percent);
    let middle = format!("({}|[.:]|{})", chars, percent);
    let last = format!("({}|:|{})", chars, percent);
    Regex::new(&format!("^({first}({middle}*{last})?)?$"))
        .expect("PN_LOCAL pattern is valid")
});

/// Serialize every quad of `graph` as Turtle
pub fn serialize(index: &QuadIndex, graph: NamedNodeRef<'_>, prefixes: &PrefixMap) -> Result<String> {
    let view = GraphView::read(index, graph)?;
    let namespaces = namespace_table(graph, prefixes);

    let mut writer = TurtleWriter {
        view: &view,
        namespaces: &namespaces,
        emitted: HashSet::new(),
        stack: Vec::new(),
        out: String::new(),
    };
    writer.write_document(graph);
    Ok(writer.out)
}

type PredicateObjects = Vec<(NamedNode, Term)>;

/// Triples of one graph grouped by subject
struct GraphView {
    named: BTreeMap<String, PredicateObjects>,
    blanks: BTreeMap<String, PredicateObjects>,
    blank_refs: HashMap<String, usize>,
}

impl GraphView {
    fn read(index: &QuadIndex, graph: NamedNodeRef<'_>) -> Result<Self> {
        let mut named: BTreeMap<String, PredicateObjects> = BTreeMap::new();
        let mut blanks: BTreeMap<String, PredicateObjects> = BTreeMap::new();
        let mut blank_refs: HashMap<String, usize> = HashMap::new();

        for quad in index.match_stream(&QuadPattern::any().graph(graph.into_owned()))? {
            let quad = quad?;
            if let Term::BlankNode(b) = &quad.object {
                *blank_refs.entry(b.as_str().to_string()).or_default() += 1;
            }
            let pair = (quad.predicate, quad.object);
            match quad.subject {
                Subject::NamedNode(n) => named.entry(n.into_string()).or_default().push(pair),
                Subject::BlankNode(b) => blanks.entry(b.into_string()).or_default().push(pair),
                #[allow(unreachable_patterns)]
                _ => {}
            }
        }

        for pairs in named.values_mut().chain(blanks.values_mut()) {
            sort_pairs(pairs);
        }

        Ok(Self {
            named,
            blanks,
            blank_refs,
        })
    }

    fn refs(&self, blank: &str) -> usize {
        self.blank_refs.get(blank).copied().unwrap_or(0)
    }
}

/// `rdf:type` first, then by predicate IRI, then by object
fn sort_pairs(pairs: &mut PredicateObjects) {
    pairs.sort_by_cached_key(|(p, o)| (p.as_ref() != rdf::TYPE, p.as_str().to_string(), o.to_string()));
}

/// Prefix directives to emit: valid names only, `:` bound to the graph
fn namespace_table(graph: NamedNodeRef<'_>, prefixes: &PrefixMap) -> Vec<(String, String)> {
    let mut table = vec![(String::new(), graph.as_str().to_string())];
    table.extend(
        prefixes
            .iter()
            .filter(|(name, _)| !name.is_empty() && PN_PREFIX.is_match(name))
            .map(|(name, ns)| (name.clone(), ns.clone())),
    );
    table
}

struct TurtleWriter<'v> {
    view: &'v GraphView,
    namespaces: &'v [(String, String)],
    emitted: HashSet<&'v str>,
    stack: Vec<&'v str>,
    out: String,
}

impl<'v> TurtleWriter<'v> {
    fn write_document(&mut self, graph: NamedNodeRef<'_>) {
        let namespaces = self.namespaces;
        for (name, ns) in namespaces {
            self.out.push_str("@prefix ");
            self.out.push_str(name);
            self.out.push_str(": ");
            write_iri_ref(&mut self.out, ns);
            self.out.push_str(" .\n");
        }
        self.out.push('\n');

        let view = self.view;
        let ontology_first = view
            .named
            .get_key_value(graph.as_str())
            .into_iter()
            .chain(view.named.iter().filter(|(iri, _)| iri.as_str() != graph.as_str()));
        for (iri, pairs) in ontology_first {
            self.write_iri(iri);
            self.out.push(' ');
            self.write_predicate_objects(pairs, "\n    ");
            self.out.push_str(" .\n\n");
        }

        // Blank nodes nothing inlined: unreferenced ones first, then shared or cyclic ones
        let leftovers: Vec<&'v str> = view
            .blanks
            .keys()
            .map(String::as_str)
            .filter(|id| view.refs(id) == 0)
            .chain(view.blanks.keys().map(String::as_str).filter(|id| view.refs(id) > 0))
            .collect();
        for id in leftovers {
            if self.emitted.contains(id) {
                continue;
            }
            self.emitted.insert(id);
            self.stack.push(id);
            self.out.push_str("_:");
            self.out.push_str(id);
            self.out.push(' ');
            self.write_predicate_objects(&view.blanks[id], "\n    ");
            self.out.push_str(" .\n\n");
            self.stack.pop();
        }

        self.out.push_str("# Generated by ontoview-core ");
        self.out.push_str(crate::VERSION);
        self.out.push('\n');
    }

    fn write_predicate_objects(&mut self, pairs: &'v [(NamedNode, Term)], separator: &str) {
        let mut start = 0;
        while start < pairs.len() {
            let predicate = &pairs[start].0;
            let end = start + pairs[start..].iter().take_while(|(p, _)| p == predicate).count();
            if start > 0 {
                self.out.push_str(" ;");
                self.out.push_str(separator);
            }
            if predicate.as_ref() == rdf::TYPE {
                self.out.push('a');
            } else {
                self.write_iri(predicate.as_str());
            }
            self.out.push(' ');
            for (i, (_, object)) in pairs[start..end].iter().enumerate() {
                if i > 0 {
                    self.out.push_str(" , ");
                }
                self.write_object(object);
            }
            start = end;
        }
    }

    fn write_object(&mut self, term: &'v Term) {
        match term {
            Term::NamedNode(n) => self.write_iri(n.as_str()),
            Term::BlankNode(b) => self.write_blank(b.as_str()),
            Term::Literal(l) => self.write_literal(l),
            #[allow(unreachable_patterns)]
            other => self.out.push_str(&other.to_string()),
        }
    }

    fn write_blank(&mut self, id: &'v str) {
        let inlinable = self.view.refs(id) == 1 && !self.emitted.contains(id) && !self.stack.contains(&id);
        if !inlinable {
            self.out.push_str("_:");
            self.out.push_str(id);
            return;
        }

        if let Some((items, cells)) = self.collect_list(id) {
            self.emitted.extend(cells.iter().copied());
            self.stack.extend(cells.iter().copied());
            self.out.push('(');
            for item in items {
                self.out.push(' ');
                self.write_object(item);
            }
            self.out.push_str(" )");
            self.stack.truncate(self.stack.len() - cells.len());
            return;
        }

        self.emitted.insert(id);
        let view = self.view;
        match view.blanks.get(id) {
            Some(pairs) if !pairs.is_empty() => {
                self.stack.push(id);
                self.out.push_str("[ ");
                self.write_predicate_objects(pairs, " ");
                self.out.push_str(" ]");
                self.stack.pop();
            }
            _ => self.out.push_str("[]"),
        }
    }

    /// Items and cells of a well-formed list starting at `head`
    fn collect_list(&self, head: &'v str) -> Option<(Vec<&'v Term>, Vec<&'v str>)> {
        let view = self.view;
        let mut items = Vec::new();
        let mut cells: Vec<&'v str> = Vec::new();
        let mut current = head;
        loop {
            if cells.contains(&current) || self.emitted.contains(current) || self.stack.contains(&current) {
                return None;
            }
            if !cells.is_empty() && view.refs(current) != 1 {
                return None;
            }
            let pairs = view.blanks.get(current)?;
            if pairs.len() != 2 {
                return None;
            }
            let first = pairs.iter().find(|(p, _)| p.as_ref() == rdf::FIRST)?;
            let rest = pairs.iter().find(|(p, _)| p.as_ref() == rdf::REST)?;
            items.push(&first.1);
            cells.push(current);
            match &rest.1 {
                Term::NamedNode(n) if n.as_ref() == rdf::NIL => return Some((items, cells)),
                Term::BlankNode(b) => current = b.as_str(),
                _ => return None,
            }
        }
    }

    fn write_literal(&mut self, literal: &Literal) {
        write_quoted(&mut self.out, literal.value());
        if let Some(language) = literal.language() {
            self.out.push('@');
            self.out.push_str(language);
        } else if literal.datatype() != xsd::STRING {
            self.out.push_str("^^");
            self.write_iri(literal.datatype().as_str());
        }
    }

    fn write_iri(&mut self, iri: &str) {
        match compact(self.namespaces, iri) {
            Some((name, local)) => {
                self.out.push_str(name);
                self.out.push(':');
                self.out.push_str(local);
            }
            None => write_iri_ref(&mut self.out, iri),
        }
    }
}

/// Longest namespace giving a valid local name
fn compact<'a>(namespaces: &'a [(String, String)], iri: &'a str) -> Option<(&'a str, &'a str)> {
    namespaces
        .iter()
        .filter(|(_, ns)| !ns.is_empty() && iri.starts_with(ns.as_str()))
        .map(|(name, ns)| (name.as_str(), ns.len(), &iri[ns.len()..]))
        .filter(|(_, _, local)| PN_LOCAL.is_match(local))
        .max_by_key(|(_, len, _)| *len)
        .map(|(name, _, local)| (name, local))
}

fn write_iri_ref(out: &mut String, iri: &str) {
    out.push('<');
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | '\u{0}'..='\u{20}' => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            _ => out.push(c),
        }
    }
    out.push('>');
}

fn write_quoted(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
