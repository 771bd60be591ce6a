pub mod candidate_graph;
