//! Interactive search: one query per input line until `quit`

use crate::client::VectorStore;
use crate::query::display::format_hits;
use crate::query::{SearchHit, SearchRequest};
use crate::workflow::search_or_empty;
use std::io::{self, BufRead, Write};

#[derive(Debug, PartialEq)]
pub enum LineOutcome {
    Quit,
    /// Blank input; nothing was searched
    Empty,
    Results(Vec<SearchHit>),
}

pub struct SearchSession<'a, S: VectorStore + ?Sized> {
    store: &'a S,
    collection: String,
    fields: Vec<String>,
    limit: usize,
}

impl<'a, S: VectorStore + ?Sized> SearchSession<'a, S> {
    pub fn new(store: &'a S, collection: impl Into<String>, fields: Vec<String>, limit: usize) -> Self {
        Self {
            store,
            collection: collection.into(),
            fields,
            limit,
        }
    }

    /// Handle one line of operator input.
    pub fn handle_line(&self, line: &str) -> LineOutcome {
        let query = line.trim();
        if query.eq_ignore_ascii_case("quit") || query.eq_ignore_ascii_case("exit") {
            return LineOutcome::Quit;
        }
        if query.is_empty() {
            return LineOutcome::Empty;
        }

        let fields: Vec<&str> = self.fields.iter().map(|f| f.as_str()).collect();
        let request = SearchRequest::new(&self.collection, query, &fields, self.limit);
        LineOutcome::Results(search_or_empty(self.store, &request).collect())
    }

    /// Drive `handle_line` from `input` until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&self, input: R, out: &mut W, snippet_chars: usize) -> io::Result<()> {
        writeln!(out, "\nEnter your search queries (type 'quit' to exit)")?;
        let mut lines = input.lines();

        loop {
            write!(out, "\nSearch query: ")?;
            out.flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;

            match self.handle_line(&line) {
                LineOutcome::Quit => break,
                LineOutcome::Empty => writeln!(out, "Please enter a valid query.")?,
                LineOutcome::Results(hits) => {
                    writeln!(out, "\nSearch results for: '{}'", line.trim())?;
                    writeln!(out, "{}", format_hits(&hits, snippet_chars, "No results found."))?;
                }
            }
        }

        Ok(())
    }
}
