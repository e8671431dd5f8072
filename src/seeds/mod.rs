pub mod demo_donors_seed;
