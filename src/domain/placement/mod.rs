pub mod placement_scorer;
