/// System instruction sent ahead of every transcript
pub const INSIGHTS_PROMPT: &str = "Provide a detailed and comprehensive summary in English of the following content about the stock market, covering all key points without omitting any important information. The summary should be long and include the following elements:

Key Points: Highlight the main topics or discussions related to the stock market.
Insights: Provide deeper analysis or important takeaways emphasized in the content.
Suggestions/Recommendations: Note any advice, strategies, or recommendations regarding stock market investments.
Positives: Discuss the positive aspects, trends, or opportunities in the stock market or specific stocks.
Negatives: Discuss any negative points, risks, or concerns raised about the stock market or specific stocks.
The summary should be thorough, ensuring all major aspects are covered in a clear, informative, and well-rounded manner, without missing any important details. Do not mention that this information is derived from a video or any other source.";
