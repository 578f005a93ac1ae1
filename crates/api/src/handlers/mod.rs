pub mod optimizations;
