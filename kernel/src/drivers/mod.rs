//! Pilotes matériels minimaux du boot
//!
//! Seul le port série existe à ce stade: c'est le puits de diagnostic du
//! noyau avant toute autre infrastructure.

pub mod serial;
