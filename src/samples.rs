//! Sample records and example queries for each preset

use crate::ingest::Record;
use crate::schema::presets::Preset;

pub fn records(preset: Preset) -> Vec<Record> {
    let pairs: &[(&str, &str)] = match preset {
        Preset::Article => &[
            (
                "Python Programming",
                "Python is a high-level programming language known for its simplicity and readability. It's great for beginners and professionals alike.",
            ),
            (
                "Machine Learning Basics",
                "Machine learning is a subset of AI that enables systems to learn from data. It's revolutionizing many industries.",
            ),
            (
                "Data Science Overview",
                "Data science combines statistics, programming, and domain expertise to extract meaningful insights from data.",
            ),
            (
                "Artificial Intelligence Introduction",
                "AI is the simulation of human intelligence by machines. It includes machine learning, natural language processing, and more.",
            ),
        ],
        Preset::Document => &[
            (
                "Introduction to AI",
                "Artificial Intelligence (AI) is the simulation of human intelligence by machines...",
            ),
            (
                "Machine Learning Basics",
                "Machine Learning is a subset of AI that focuses on training models to learn from data...",
            ),
            (
                "Deep Learning Overview",
                "Deep Learning is a type of machine learning based on artificial neural networks...",
            ),
        ],
    };

    pairs
        .iter()
        .map(|(title, content)| Record::new().with("title", *title).with("content", *content))
        .collect()
}

pub fn example_queries(preset: Preset) -> &'static [&'static str] {
    match preset {
        Preset::Article => &[
            "What is Python used for?",
            "Explain machine learning",
            "How does data science work?",
        ],
        Preset::Document => &[
            "What is artificial intelligence?",
            "Explain machine learning concepts",
            "How do neural networks work?",
        ],
    }
}
