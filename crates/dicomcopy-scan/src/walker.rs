//! Depth-first traversal with pre-order decisions.

use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// What the walker should do after a visitor callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitFlow {
    /// Keep going; for a directory pre-visit, enter it.
    Enter,
    /// Do not enter this directory; siblings are still visited.
    Skip,
    /// Abandon the whole walk.
    Stop,
}

/// Callbacks for each node kind reached by [`walk`].
pub trait Visitor {
    /// Called before any child of `dir` is listed.
    fn pre_visit_directory(&mut self, dir: &Path) -> VisitFlow;

    /// Called for every non-directory entry, symbolic links included.
    fn visit_file(&mut self, file: &Path) -> VisitFlow;

    /// Called when an entry's metadata cannot be read.
    fn visit_file_failed(&mut self, path: &Path, error: &io::Error) -> VisitFlow;

    /// Called after the children of an entered directory, with the listing
    /// error that cut the iteration short, if any.
    fn post_visit_directory(&mut self, dir: &Path, error: Option<&io::Error>) -> VisitFlow;
}

/// A directory the visitor entered whose post-visit is still due.
struct OpenDir {
    depth: usize,
    path: PathBuf,
    error: Option<io::Error>,
}

impl OpenDir {
    /// Keep the first listing error.
    fn record(&mut self, err: &walkdir::Error) {
        if self.error.is_none() {
            self.error = Some(into_io(err));
        }
    }
}

/// Walk the tree under `root` depth-first.
///
/// Children are visited in the order the file system reports them. Symbolic
/// links are never entered as directories, the root included. Returns
/// `Break` if a visitor stopped the walk.
pub fn walk<V: Visitor + ?Sized>(root: &Path, visitor: &mut V) -> ControlFlow<()> {
    let mut open: Vec<OpenDir> = Vec::new();
    let mut entries = WalkDir::new(root)
        .follow_links(false)
        .follow_root_links(false)
        .into_iter();

    while let Some(next) = entries.next() {
        match next {
            Ok(entry) => {
                finish_dirs(&mut open, entry.depth(), visitor)?;
                let path = entry.path();
                if !entry.file_type().is_dir() {
                    continue_unless_stopped(visitor.visit_file(path))?;
                    continue;
                }
                match visitor.pre_visit_directory(path) {
                    VisitFlow::Enter => open.push(OpenDir {
                        depth: entry.depth(),
                        path: path.to_path_buf(),
                        error: None,
                    }),
                    VisitFlow::Skip => entries.skip_current_dir(),
                    VisitFlow::Stop => return ControlFlow::Break(()),
                }
            }
            Err(err) => {
                // walkdir reports a failed listing at the depth of the
                // directory itself, right after yielding it.
                if let Some(dir) = open.last_mut() {
                    if err.depth() == dir.depth && err.path() == Some(dir.path.as_path()) {
                        dir.record(&err);
                        continue;
                    }
                }

                finish_dirs(&mut open, err.depth(), visitor)?;
                match err.path() {
                    Some(path) => {
                        continue_unless_stopped(visitor.visit_file_failed(path, &into_io(&err)))?;
                    }
                    // Iteration broke inside the current listing.
                    None => {
                        if let Some(dir) = open.last_mut() {
                            dir.record(&err);
                        }
                    }
                }
            }
        }
    }

    finish_dirs(&mut open, 0, visitor)
}

/// Post-visit every open directory at `depth` or deeper, innermost first.
fn finish_dirs<V: Visitor + ?Sized>(
    open: &mut Vec<OpenDir>,
    depth: usize,
    visitor: &mut V,
) -> ControlFlow<()> {
    while open.last().is_some_and(|dir| dir.depth >= depth) {
        let Some(dir) = open.pop() else { break };
        continue_unless_stopped(visitor.post_visit_directory(&dir.path, dir.error.as_ref()))?;
    }
    ControlFlow::Continue(())
}

fn continue_unless_stopped(flow: VisitFlow) -> ControlFlow<()> {
    match flow {
        VisitFlow::Stop => ControlFlow::Break(()),
        VisitFlow::Enter | VisitFlow::Skip => ControlFlow::Continue(()),
    }
}

/// Flatten a walkdir error to the underlying I/O error kind and message.
fn into_io(err: &walkdir::Error) -> io::Error {
    match err.io_error() {
        Some(inner) => io::Error::new(inner.kind(), inner.to_string()),
        None => io::Error::other(err.to_string()),
    }
}

/// Check whether any immediate child of `dir` satisfies `predicate`.
///
/// Stops at the first match. Listing errors are returned to the caller.
pub fn any_entry<F>(dir: &Path, mut predicate: F) -> io::Result<bool>
where
    F: FnMut(&Path) -> bool,
{
    let children = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false);
    for entry in children {
        let entry = entry.map_err(|e| into_io(&e))?;
        if predicate(entry.path()) {
            return Ok(true);
        }
    }
    Ok(false)
}
