// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strongly connected components over the dependency graph.

use indexmap::IndexMap;

/// Tarjan's algorithm, iterative so deep chains cannot overflow the stack.
///
/// Nodes inside each component are listed in visit order; components come
/// out in completion order. Edges to nodes absent from `edges` are ignored
/// (callers resolve edges before building the graph).
pub(crate) fn strongly_connected_components(
    edges: &IndexMap<String, Vec<String>>,
) -> Vec<Vec<String>> {
    let names: Vec<&String> = edges.keys().collect();
    let adjacency: Vec<Vec<usize>> = edges
        .values()
        .map(|targets| {
            targets.iter().filter_map(|t| edges.get_index_of(t.as_str())).collect()
        })
        .collect();
    let node_count = names.len();

    let mut next_index = 0usize;
    let mut indices: Vec<Option<usize>> = vec![None; node_count];
    let mut lowlink: Vec<usize> = vec![0; node_count];
    let mut on_stack: Vec<bool> = vec![false; node_count];
    let mut stack: Vec<usize> = Vec::new();
    let mut components: Vec<Vec<String>> = Vec::new();

    // Work frames: (node, offset of the next unexplored edge)
    let mut work: Vec<(usize, usize)> = Vec::new();

    for root in 0..node_count {
        if indices[root].is_some() {
            continue;
        }
        work.push((root, 0));
        while let Some(&(node, edge_offset)) = work.last() {
            if edge_offset == 0 {
                indices[node] = Some(next_index);
                lowlink[node] = next_index;
                next_index += 1;
                stack.push(node);
                on_stack[node] = true;
            }

            let mut offset = edge_offset;
            let mut descended = false;
            while offset < adjacency[node].len() {
                let target = adjacency[node][offset];
                offset += 1;
                match indices[target] {
                    None => {
                        descended = true;
                        break;
                    }
                    Some(target_index) => {
                        if on_stack[target] {
                            lowlink[node] = lowlink[node].min(target_index);
                        }
                    }
                }
            }
            if let Some(frame) = work.last_mut() {
                frame.1 = offset;
            }
            if descended {
                // offset - 1 is the edge we are descending into
                work.push((adjacency[node][offset - 1], 0));
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[node]);
            }
            if indices[node] == Some(lowlink[node]) {
                let mut component = Vec::new();
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component.push(names[member].clone());
                    if member == node {
                        break;
                    }
                }
                // Popped in reverse visit order; flip so the first-visited
                // node leads the cycle listing.
                component.reverse();
                components.push(component);
            }
        }
    }

    components
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
