use katz_core::io::build_output_path;
use katz_core::model::bag::most_likely_sequence;
use katz_core::{GenerationSettings, Generator, KatzModel, StartSeed, TrainingSettings};
use log::info;

const RHYME: &str = "humpty dumpty sat on a wall humpty dumpty had a great fall \
    all the king 's horses and all the king 's men could not put humpty together again";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Train on the file given as first argument, one document per line,
    // or on the built-in rhyme
    let input = std::env::args().nth(1);
    let documents: Vec<Vec<String>> = match &input {
        Some(path) => std::fs::read_to_string(path)?
            .lines()
            .map(|line| line.split_whitespace().map(str::to_lowercase).collect())
            .collect(),
        None => vec![RHYME.split_whitespace().map(str::to_owned).collect()],
    };

    // Trigrams, counted on every core
    let settings = TrainingSettings::new(3)?;
    let model = KatzModel::train_parallel(&settings, &documents)?;
    info!("trained an order {} model over {} vocabulary entries", model.order(), model.vocabulary().len());

    // Save next to the input (or in the working directory) and reload
    let path = build_output_path(input.as_deref().unwrap_or("rhyme.txt"), "katz")?;
    model.save(&path)?;
    let model = KatzModel::load(&path)?;
    println!("Model saved to {}", path.display());

    // Seen, backed-off and unknown n-grams
    for ngram in [["humpty", "dumpty", "sat"], ["humpty", "dumpty", "together"], ["fat", "cat", "stood"]] {
        println!("ln P({}) = {:.4}", ngram.join(" "), model.log_p_katz(&ngram)?);
    }

    // Invalid query length
    match model.log_p_katz(&["a", "b", "c", "d"]) {
        Ok(_) => println!("Should not happen"),
        Err(error) => println!("{}", error),
    }

    // Training order scores better than a shuffle of the same words
    println!("Perplexity (ordered): {:.3}", model.perplexity("humpty dumpty sat on a wall".split_whitespace())?);
    println!("Perplexity (shuffled): {:.3}", model.perplexity("wall a on sat dumpty humpty".split_whitespace())?);

    // Randomness must be between 0.0 and 1.0
    let mut generation = GenerationSettings::default();
    generation.max_tokens = 10;
    match generation.set_randomness(2.0) {
        Ok(_) => println!("Should not happen"),
        Err(error) => println!("{}", error),
    }

    // Greedy from the start markers, then sampled from a custom prompt
    let generator = Generator::new(&model);
    generation.set_randomness(0.0)?;
    println!("Greedy: {}", generator.generate_text(&generation)?);
    generation.set_randomness(0.5)?;
    generation.start_seed = StartSeed::Custom(vec!["all".to_owned(), "the".to_owned()]);
    for i in 0..3 {
        println!("Sampled {}: {}", i + 1, generator.generate_text(&generation)?);
    }

    // Put a bag of words back in order
    let bag = ["wall", "sat", "dumpty", "a", "humpty", "on"];
    println!("Ordered bag: {}", most_likely_sequence(&model, &bag).join(" "));

    Ok(())
}
