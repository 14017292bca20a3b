//! Package import graph.
//!
//! Packages live in an arena and refer to their imports by index. The
//! default loader is [`golist::GoListWalker`].

use std::collections::HashMap;

use crate::error::GraphError;
use crate::models::Package;

pub mod golist;

pub use golist::{GoEnv, GoListWalker};

/// Produces the transitive import graph for a set of entry points.
pub trait GraphWalker {
    fn load(&self, entry_points: &[String]) -> Result<PackageGraph, GraphError>;
}

#[derive(Debug, Default)]
pub struct PackageGraph {
    packages: Vec<Package>,
    index: HashMap<String, usize>,
    roots: Vec<usize>,
}

impl PackageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a package, returning its index. A second package with the same
    /// import path is ignored and the existing index is returned.
    pub fn add(&mut self, package: Package) -> usize {
        if let Some(&idx) = self.index.get(&package.import_path) {
            return idx;
        }
        let idx = self.packages.len();
        self.index.insert(package.import_path.clone(), idx);
        self.packages.push(package);
        idx
    }

    pub fn add_root(&mut self, idx: usize) {
        if idx < self.packages.len() && !self.roots.contains(&idx) {
            self.roots.push(idx);
        }
    }

    /// Record that `from` imports `to`.
    pub fn link(&mut self, from: usize, to: usize) {
        if to >= self.packages.len() {
            return;
        }
        if let Some(pkg) = self.packages.get_mut(from) {
            if !pkg.imports.contains(&to) {
                pkg.imports.push(to);
            }
        }
    }

    pub fn get(&self, idx: usize) -> Option<&Package> {
        self.packages.get(idx)
    }

    pub fn find(&self, import_path: &str) -> Option<usize> {
        self.index.get(import_path).copied()
    }

    pub fn roots(&self) -> impl Iterator<Item = &Package> {
        self.roots.iter().map(|&i| &self.packages[i])
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Depth-first walk from the roots. Every reachable package is passed to
    /// `pre` exactly once; returning `false` prunes its imports.
    pub fn visit<F>(&self, mut pre: F)
    where
        F: FnMut(&Package) -> bool,
    {
        let mut visited = vec![false; self.packages.len()];
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();

        while let Some(idx) = stack.pop() {
            if std::mem::replace(&mut visited[idx], true) {
                continue;
            }
            let Some(pkg) = self.get(idx) else { continue };
            if pre(pkg) {
                stack.extend(pkg.imports.iter().rev().filter(|&&i| !visited[i]));
            }
        }
    }
}
